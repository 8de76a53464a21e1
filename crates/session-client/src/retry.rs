//! Supervised connect attempts.
//!
//! Each attempt runs in its own task tagged with an epoch. The actor keeps
//! at most one [`RetryTask`] and ignores notices whose epoch is not current,
//! so a cancelled attempt can never revive a disconnected session.

use crate::credentials::{CredentialRequest, CredentialSource};
use crate::error::SessionError;
use crate::provider::{ProviderConnection, StreamingProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Progress reported by a retry task.
#[derive(Debug)]
pub(crate) enum RetryNotice {
    /// Retry delay elapsed; the attempt is starting.
    TimerFired { epoch: u64 },
    /// The attempt finished.
    Finished {
        epoch: u64,
        result: Result<ProviderConnection, SessionError>,
    },
}

/// One connect attempt: fetch a fresh credential, open the provider
/// session, and publish the microphone for publishers.
pub(crate) struct Attempt {
    pub credentials: Arc<dyn CredentialSource>,
    pub provider: Arc<dyn StreamingProvider>,
    pub request: CredentialRequest,
}

impl Attempt {
    /// Run the attempt until it finishes or `cancel` fires.
    ///
    /// Returns `None` when cancelled. A session opened before cancellation
    /// is closed here, so nothing outlives a cancelled attempt.
    async fn run(
        &self,
        cancel: &CancellationToken,
    ) -> Option<Result<ProviderConnection, SessionError>> {
        let opened = tokio::select! {
            () = cancel.cancelled() => return None,
            opened = self.open() => opened,
        };

        let mut connection = match opened {
            Ok(connection) => connection,
            Err(e) => return Some(Err(e)),
        };

        if !self.request.is_publisher {
            return Some(Ok(connection));
        }

        let published = tokio::select! {
            () = cancel.cancelled() => None,
            published = connection.session.publish_microphone() => Some(published),
        };

        match published {
            Some(Ok(())) => Some(Ok(connection)),
            Some(Err(e)) => {
                connection.session.close().await;
                Some(Err(e.into()))
            }
            None => {
                debug!(
                    target: "session_client.retry",
                    "Attempt cancelled while publishing, closing session"
                );
                connection.session.close().await;
                None
            }
        }
    }

    async fn open(&self) -> Result<ProviderConnection, SessionError> {
        let credential = self.credentials.fetch(&self.request).await?;
        let connection = self
            .provider
            .connect(&credential.url, &credential.token)
            .await?;
        Ok(connection)
    }
}

/// Handle to a running attempt.
#[derive(Debug)]
pub(crate) struct RetryTask {
    epoch: u64,
    cancel_token: CancellationToken,
}

impl RetryTask {
    /// Spawn an attempt, optionally after `delay`.
    ///
    /// `parent` is the actor's token; cancelling it cancels the attempt too.
    pub(crate) fn spawn(
        epoch: u64,
        delay: Option<Duration>,
        attempt: Attempt,
        notices: mpsc::Sender<RetryNotice>,
        parent: &CancellationToken,
    ) -> Self {
        let cancel_token = parent.child_token();
        let task_token = cancel_token.clone();

        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    () = task_token.cancelled() => return,
                    () = tokio::time::sleep(delay) => {}
                }
                if notices.send(RetryNotice::TimerFired { epoch }).await.is_err() {
                    return;
                }
            }

            let Some(result) = attempt.run(&task_token).await else {
                return;
            };

            if task_token.is_cancelled() {
                close_unclaimed(result, epoch).await;
                return;
            }

            if let Err(mpsc::error::SendError(notice)) = notices
                .send(RetryNotice::Finished { epoch, result })
                .await
            {
                if let RetryNotice::Finished { result, .. } = notice {
                    close_unclaimed(result, epoch).await;
                }
            }
        });

        Self {
            epoch,
            cancel_token,
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stop the attempt. A connection it already opened is closed by the
    /// task itself.
    pub(crate) fn cancel(self) {
        self.cancel_token.cancel();
    }
}

async fn close_unclaimed(result: Result<ProviderConnection, SessionError>, epoch: u64) {
    if let Ok(mut connection) = result {
        debug!(
            target: "session_client.retry",
            epoch,
            "Closing connection from cancelled attempt"
        );
        connection.session.close().await;
    }
}
