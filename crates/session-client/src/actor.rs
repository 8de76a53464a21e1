//! `SessionActor` - one task per session.
//!
//! The actor owns every piece of session state: the live provider session,
//! the playback elements keyed by track id, mute and volume, and the
//! reconnect counter. It processes one input at a time from three sources:
//! - commands from [`SessionHandle`]
//! - notices from the current [`RetryTask`]
//! - events from the live provider session
//!
//! # Lifecycle
//!
//! 1. Spawned idle by [`SessionActor::spawn`]
//! 2. Runs until shutdown is requested or every handle is dropped
//! 3. On exit the live session is closed and all playback released

use crate::config::SessionConfig;
use crate::credentials::CredentialSource;
use crate::error::SessionError;
use crate::messages::{ConnectTarget, SessionCommand, SessionStatus};
use crate::provider::{
    AudioOutput, PlaybackElement, ProviderConnection, ProviderEvent, ProviderSession,
    RemoteTrack, StreamingProvider,
};
use crate::retry::{Attempt, RetryNotice, RetryTask};
use crate::state::{FailureDisposition, RetryPolicy, SessionInput, SessionState};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Channel buffer size for handle commands.
const COMMAND_CHANNEL_BUFFER: usize = 32;

/// Channel buffer size for retry notices.
const NOTICE_CHANNEL_BUFFER: usize = 8;

/// Handle to a `SessionActor`.
///
/// Cheap to clone; pass it to whatever drives the UI controls.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
    cancel_token: CancellationToken,
}

impl SessionHandle {
    /// Start connecting to `target`.
    ///
    /// Returns once the attempt is scheduled; watch [`subscribe`](Self::subscribe)
    /// for the outcome.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if a session is already active, `Closed` if the
    /// actor has stopped.
    pub async fn connect(&self, target: ConnectTarget) -> Result<(), SessionError> {
        self.request(|respond_to| SessionCommand::Connect { target, respond_to })
            .await?
    }

    /// End the session. A no-op when nothing is active.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        self.request(|respond_to| SessionCommand::Disconnect { respond_to })
            .await
    }

    /// Stop publishing and end the session.
    pub async fn stop_publishing(&self) -> Result<(), SessionError> {
        self.request(|respond_to| SessionCommand::StopPublishing { respond_to })
            .await
    }

    /// Flip the mute flag; returns the new value.
    pub async fn toggle_mute(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| SessionCommand::ToggleMute { respond_to })
            .await
    }

    /// Set playback volume; returns the applied value after clamping.
    pub async fn set_volume(&self, volume: f32) -> Result<f32, SessionError> {
        self.request(|respond_to| SessionCommand::SetVolume { volume, respond_to })
            .await
    }

    /// Latest published status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Stop the actor. The live session, if any, is closed on the way out.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor has been told to stop.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(command(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// An open provider session and its event stream.
struct LiveSession {
    session: Box<dyn ProviderSession>,
    events: mpsc::Receiver<ProviderEvent>,
}

impl From<ProviderConnection> for LiveSession {
    fn from(connection: ProviderConnection) -> Self {
        Self {
            session: connection.session,
            events: connection.events,
        }
    }
}

/// The `SessionActor` implementation.
pub struct SessionActor {
    config: SessionConfig,
    policy: RetryPolicy,
    credentials: Arc<dyn CredentialSource>,
    provider: Arc<dyn StreamingProvider>,
    audio: Arc<dyn AudioOutput>,
    commands: mpsc::Receiver<SessionCommand>,
    notices_tx: mpsc::Sender<RetryNotice>,
    notices_rx: mpsc::Receiver<RetryNotice>,
    status_tx: watch::Sender<SessionStatus>,
    cancel_token: CancellationToken,

    state: SessionState,
    target: Option<ConnectTarget>,
    /// Attempt number within the current reconnect cycle.
    attempt: u32,
    /// Epoch of the most recently spawned attempt.
    epoch: u64,
    retry: Option<RetryTask>,
    live: Option<LiveSession>,
    playback: HashMap<String, Box<dyn PlaybackElement>>,
    participants: HashSet<String>,
    muted: bool,
    volume: f32,
    last_failure: Option<SessionError>,
}

impl SessionActor {
    /// Spawn a new idle session actor.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        config: SessionConfig,
        credentials: Arc<dyn CredentialSource>,
        provider: Arc<dyn StreamingProvider>,
        audio: Arc<dyn AudioOutput>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (sender, commands) = mpsc::channel(COMMAND_CHANNEL_BUFFER);
        let (notices_tx, notices_rx) = mpsc::channel(NOTICE_CHANNEL_BUFFER);
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());
        let cancel_token = CancellationToken::new();

        let actor = Self {
            policy: RetryPolicy {
                max_attempts: config.max_attempts,
            },
            config,
            credentials,
            provider,
            audio,
            commands,
            notices_tx,
            notices_rx,
            status_tx,
            cancel_token: cancel_token.clone(),
            state: SessionState::Idle,
            target: None,
            attempt: 0,
            epoch: 0,
            retry: None,
            live: None,
            playback: HashMap::new(),
            participants: HashSet::new(),
            muted: false,
            volume: 1.0,
            last_failure: None,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SessionHandle {
            sender,
            status: status_rx,
            cancel_token,
        };

        (handle, task_handle)
    }

    /// Run the actor loop.
    #[instrument(skip_all, name = "session_client.actor")]
    async fn run(mut self) {
        debug!(target: "session_client.actor", "SessionActor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(target: "session_client.actor", "SessionActor received cancellation signal");
                    break;
                }

                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!(target: "session_client.actor", "All handles dropped, exiting");
                            break;
                        }
                    }
                }

                Some(notice) = self.notices_rx.recv() => {
                    self.handle_notice(notice).await;
                }

                event = next_event(&mut self.live) => {
                    self.handle_provider_event(event).await;
                }
            }

            self.publish_status();
        }

        if self.state.is_active() {
            self.transition(SessionInput::Disconnect);
        }
        self.end_session().await;
        self.publish_status();

        info!(target: "session_client.actor", "SessionActor stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Connect { target, respond_to } => {
                let result = self.handle_connect(target);
                let _ = respond_to.send(result);
            }
            SessionCommand::Disconnect { respond_to } => {
                self.handle_disconnect(SessionInput::Disconnect).await;
                let _ = respond_to.send(());
            }
            SessionCommand::StopPublishing { respond_to } => {
                self.handle_disconnect(SessionInput::StopPublishing).await;
                let _ = respond_to.send(());
            }
            SessionCommand::ToggleMute { respond_to } => {
                self.muted = !self.muted;
                for element in self.playback.values_mut() {
                    element.set_muted(self.muted);
                }
                debug!(target: "session_client.actor", muted = self.muted, "Mute toggled");
                let _ = respond_to.send(self.muted);
            }
            SessionCommand::SetVolume { volume, respond_to } => {
                if volume.is_finite() {
                    self.volume = volume.clamp(0.0, 1.0);
                    for element in self.playback.values_mut() {
                        element.set_volume(self.volume);
                    }
                } else {
                    warn!(target: "session_client.actor", "Ignoring non-finite volume");
                }
                let _ = respond_to.send(self.volume);
            }
        }
    }

    fn handle_connect(&mut self, target: ConnectTarget) -> Result<(), SessionError> {
        let from = self.state;
        if !self.transition(SessionInput::Connect) {
            return Err(SessionError::InvalidTransition {
                from,
                input: SessionInput::Connect.name(),
            });
        }

        info!(
            target: "session_client.actor",
            room = %target.room,
            role = ?target.role,
            "Connecting"
        );

        self.target = Some(target);
        self.attempt = 0;
        self.last_failure = None;
        self.spawn_attempt(None);
        Ok(())
    }

    async fn handle_disconnect(&mut self, input: SessionInput) {
        if !self.transition(input) {
            return;
        }

        info!(target: "session_client.actor", reason = input.name(), "Disconnecting");
        self.end_session().await;
        self.attempt = 0;
        self.last_failure = None;
    }

    async fn handle_notice(&mut self, notice: RetryNotice) {
        let current = self.retry.as_ref().map(RetryTask::epoch);

        match notice {
            RetryNotice::TimerFired { epoch } if Some(epoch) == current => {
                if self.transition(SessionInput::RetryTimerFired) {
                    self.attempt += 1;
                    info!(
                        target: "session_client.actor",
                        attempt = self.attempt,
                        max_attempts = self.policy.max_attempts,
                        "Reconnect attempt starting"
                    );
                }
            }
            RetryNotice::Finished { epoch, result } if Some(epoch) == current => {
                self.retry = None;
                match result {
                    Ok(connection) => self.on_attempt_succeeded(connection).await,
                    Err(error) => self.on_attempt_failed(error),
                }
            }
            RetryNotice::TimerFired { epoch } => {
                debug!(target: "session_client.actor", epoch, "Discarding stale retry timer");
            }
            RetryNotice::Finished { epoch, result } => {
                debug!(target: "session_client.actor", epoch, "Discarding stale attempt outcome");
                if let Ok(mut connection) = result {
                    connection.session.close().await;
                }
            }
        }
    }

    async fn on_attempt_succeeded(&mut self, mut connection: ProviderConnection) {
        if !self.transition(SessionInput::AttemptSucceeded) {
            connection.session.close().await;
            return;
        }

        info!(
            target: "session_client.actor",
            attempt = self.attempt,
            "Connected"
        );
        self.attempt = 0;
        self.last_failure = None;
        self.live = Some(connection.into());
    }

    fn on_attempt_failed(&mut self, error: SessionError) {
        let disposition = self.policy.after_failure(&error, self.attempt);

        warn!(
            target: "session_client.actor",
            attempt = self.attempt,
            kind = error.kind(),
            error = %error,
            "Connect attempt failed"
        );

        self.transition(SessionInput::AttemptFailed(disposition));
        self.last_failure = Some(error);

        match disposition {
            FailureDisposition::Retry => self.spawn_attempt(Some(self.config.retry_delay)),
            FailureDisposition::GiveUp => {
                error!(
                    target: "session_client.actor",
                    attempt = self.attempt,
                    "Giving up on session"
                );
            }
        }
    }

    async fn handle_provider_event(&mut self, event: Option<ProviderEvent>) {
        match event {
            Some(ProviderEvent::ParticipantJoined { identity }) => {
                self.participants.insert(identity);
            }
            Some(ProviderEvent::ParticipantLeft { identity }) => {
                self.participants.remove(&identity);
            }
            Some(ProviderEvent::TrackSubscribed(track)) => self.attach_track(&track),
            Some(ProviderEvent::TrackUnsubscribed { track_id }) => {
                if let Some(mut element) = self.playback.remove(&track_id) {
                    element.release();
                    debug!(target: "session_client.actor", track_id = %track_id, "Track detached");
                }
            }
            Some(ProviderEvent::Disconnected { reason }) => self.on_provider_lost(&reason).await,
            None => self.on_provider_lost("event stream closed").await,
        }
    }

    fn attach_track(&mut self, track: &RemoteTrack) {
        if self.state != SessionState::Connected {
            return;
        }
        if self.target.as_ref().is_some_and(ConnectTarget::is_publisher) {
            debug!(
                target: "session_client.actor",
                track_id = %track.track_id,
                "Publisher session ignores remote track"
            );
            return;
        }

        let mut element = self.audio.attach(track);
        element.set_muted(self.muted);
        element.set_volume(self.volume);

        if let Some(mut previous) = self.playback.insert(track.track_id.clone(), element) {
            previous.release();
        }

        debug!(
            target: "session_client.actor",
            track_id = %track.track_id,
            attached = self.playback.len(),
            "Track attached"
        );
    }

    async fn on_provider_lost(&mut self, reason: &str) {
        if !self.transition(SessionInput::ProviderDisconnected) {
            return;
        }

        warn!(target: "session_client.actor", reason = %reason, "Provider disconnected");

        self.release_playback();
        if let Some(mut live) = self.live.take() {
            live.session.close().await;
        }
        self.participants.clear();
        self.attempt = 0;
        self.last_failure = Some(SessionError::Transport(format!(
            "Provider disconnected: {reason}"
        )));
        self.spawn_attempt(Some(self.config.retry_delay));
    }

    /// Release everything the session holds.
    async fn end_session(&mut self) {
        if let Some(task) = self.retry.take() {
            task.cancel();
        }
        self.release_playback();

        if let Some(mut live) = self.live.take() {
            if self.target.as_ref().is_some_and(ConnectTarget::is_publisher) {
                if let Err(e) = live.session.unpublish_microphone().await {
                    warn!(target: "session_client.actor", error = %e, "Failed to unpublish microphone");
                }
            }
            live.session.close().await;
        }
        self.participants.clear();
    }

    fn release_playback(&mut self) {
        for (_, mut element) in self.playback.drain() {
            element.release();
        }
    }

    fn spawn_attempt(&mut self, delay: Option<Duration>) {
        let Some(target) = &self.target else {
            return;
        };

        if let Some(previous) = self.retry.take() {
            previous.cancel();
        }

        self.epoch += 1;
        let attempt = Attempt {
            credentials: Arc::clone(&self.credentials),
            provider: Arc::clone(&self.provider),
            request: target.credential_request(),
        };
        self.retry = Some(RetryTask::spawn(
            self.epoch,
            delay,
            attempt,
            self.notices_tx.clone(),
            &self.cancel_token,
        ));
    }

    /// Apply `input`. Returns false, leaving the state unchanged, if the
    /// input does not apply.
    fn transition(&mut self, input: SessionInput) -> bool {
        match self.state.on(input) {
            Some(next) => {
                debug!(
                    target: "session_client.actor",
                    from = %self.state,
                    to = %next,
                    input = ?input,
                    "Session transition"
                );
                self.state = next;
                true
            }
            None => {
                debug!(
                    target: "session_client.actor",
                    state = %self.state,
                    input = ?input,
                    "Input ignored in current state"
                );
                false
            }
        }
    }

    fn publish_status(&self) {
        let status = SessionStatus {
            state: self.state,
            attempt: self.attempt,
            muted: self.muted,
            volume: self.volume,
            attached_tracks: self.playback.len(),
            participants: self.participants.len(),
            room: self.target.as_ref().map(|t| t.room.to_string()),
            language: self.target.as_ref().and_then(|t| t.room.language()),
            last_failure: self.last_failure.clone(),
        };

        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// Next event from the live session, or never if there is none.
async fn next_event(live: &mut Option<LiveSession>) -> Option<ProviderEvent> {
    match live {
        Some(live) => live.events.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockAudioOutput, MockCredentialSource, MockStreamingProvider};
    use common::rooms::Language;

    fn spawn_actor(
        provider: MockStreamingProvider,
    ) -> (
        SessionHandle,
        JoinHandle<()>,
        Arc<MockStreamingProvider>,
        Arc<MockAudioOutput>,
    ) {
        let provider = Arc::new(provider);
        let audio = Arc::new(MockAudioOutput::new());
        let (handle, task) = SessionActor::spawn(
            SessionConfig::default(),
            Arc::new(MockCredentialSource::accepting()),
            provider.clone(),
            audio.clone(),
        );
        (handle, task, provider, audio)
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_starts_idle() {
        let (handle, _task, provider, _audio) = spawn_actor(MockStreamingProvider::accepting());

        let status = handle.status();
        assert_eq!(status.state, SessionState::Idle);
        assert_eq!(status.volume, 1.0);
        assert!(!status.muted);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_when_idle_is_noop() {
        let (handle, _task, _provider, _audio) = spawn_actor(MockStreamingProvider::accepting());

        handle.disconnect().await.unwrap();
        assert_eq!(handle.status().state, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_all_handles_stops_actor() {
        let (handle, task, _provider, _audio) = spawn_actor(MockStreamingProvider::accepting());

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_everything() {
        let (handle, task, provider, audio) = spawn_actor(MockStreamingProvider::accepting());

        handle
            .connect(ConnectTarget::listener(Language::English))
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.state == SessionState::Connected)
            .await
            .unwrap();

        let connection = provider.latest_connection().unwrap();
        connection.add_track("TR_a", "interpreter-en-1").await;
        rx.wait_for(|s| s.attached_tracks == 1).await.unwrap();

        handle.shutdown();
        task.await.unwrap();

        assert!(handle.is_shut_down());
        assert_eq!(handle.status().state, SessionState::Disconnected);
        assert_eq!(handle.status().attached_tracks, 0);
        assert!(audio.element(0).unwrap().is_released());
        assert!(connection.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_after_shutdown_report_closed() {
        let (handle, task, _provider, _audio) = spawn_actor(MockStreamingProvider::accepting());

        handle.shutdown();
        task.await.unwrap();

        let err = handle
            .connect(ConnectTarget::listener(Language::English))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Closed);
        assert_eq!(handle.toggle_mute().await, Err(SessionError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_from_dropped_connection_are_ignored() {
        let (handle, _task, provider, audio) = spawn_actor(MockStreamingProvider::accepting());

        handle
            .connect(ConnectTarget::listener(Language::English))
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.state == SessionState::Connected)
            .await
            .unwrap();

        let connection = provider.latest_connection().unwrap();
        connection.drop_connection("server restart").await;
        rx.wait_for(|s| s.state == SessionState::Reconnecting)
            .await
            .unwrap();
        assert!(connection.is_closed());

        // Old event stream is gone; nothing can attach while reconnecting.
        connection.add_track("TR_late", "interpreter-en-1").await;
        tokio::task::yield_now().await;

        assert_eq!(audio.attached_count(), 0);
        assert_eq!(handle.status().attached_tracks, 0);
    }
}
