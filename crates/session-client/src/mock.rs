//! Mock collaborators for testing.
//!
//! In-memory implementations of [`CredentialSource`], [`StreamingProvider`]
//! and [`AudioOutput`] that record what the session actor asked of them and
//! let a test drive provider events by hand.

use crate::credentials::{Credential, CredentialRequest, CredentialSource};
use crate::error::{CredentialError, ProviderError};
use crate::provider::{
    AudioOutput, PlaybackElement, ProviderConnection, ProviderEvent, ProviderSession,
    RemoteTrack, StreamingProvider,
};
use async_trait::async_trait;
use common::secret::SecretString;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

/// Event buffer for mock connections.
const MOCK_EVENT_BUFFER: usize = 64;

/// URL handed out by [`MockCredentialSource`].
pub const MOCK_PROVIDER_URL: &str = "wss://mock.livekit.test";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock credential source.
pub struct MockCredentialSource {
    /// Responses to return in order; the last one repeats.
    responses: Vec<Result<(), CredentialError>>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<CredentialRequest>>,
}

impl MockCredentialSource {
    /// Create a mock that always issues a credential.
    pub fn accepting() -> Self {
        Self::with_responses(vec![Ok(())])
    }

    /// Create a mock that always rejects with `status`.
    pub fn rejecting(status: u16) -> Self {
        Self::with_responses(vec![Err(CredentialError::Rejected {
            status,
            message: "Mock issuer rejection".to_string(),
        })])
    }

    /// Create a mock that answers with `responses` in sequence. Once
    /// exhausted the last response repeats.
    pub fn with_responses(responses: Vec<Result<(), CredentialError>>) -> Self {
        Self {
            responses,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CredentialRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl CredentialSource for MockCredentialSource {
    async fn fetch(&self, request: &CredentialRequest) -> Result<Credential, CredentialError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        let response = self
            .responses
            .get(count)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or(Ok(()));

        response.map(|()| Credential {
            token: SecretString::from(format!("mock-token-{count}")),
            url: MOCK_PROVIDER_URL.to_string(),
        })
    }
}

/// How the mock provider answers one connect call.
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    /// Open a session immediately.
    Accept,
    /// Open a session after a delay.
    AcceptAfter(Duration),
    /// Fail the connect.
    Fail(ProviderError),
    /// Open a session whose microphone publish is denied.
    DenyMicrophone,
    /// Open a session whose microphone publish takes this long, like a
    /// permission prompt the user has not answered yet.
    SlowMicrophone(Duration),
}

/// Shared state of one mock session.
#[derive(Debug, Default)]
pub struct MockSessionState {
    publishing: AtomicBool,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

/// Test-side control of a connection opened by [`MockStreamingProvider`].
#[derive(Debug, Clone)]
pub struct MockConnectionControl {
    events: mpsc::Sender<ProviderEvent>,
    state: Arc<MockSessionState>,
    token: String,
}

impl MockConnectionControl {
    /// Deliver `event` to the session. Ignored once the session stopped
    /// listening.
    pub async fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event).await;
    }

    /// Subscribe the session to a remote track.
    pub async fn add_track(&self, track_id: &str, participant: &str) {
        self.emit(ProviderEvent::TrackSubscribed(RemoteTrack {
            track_id: track_id.to_string(),
            participant: participant.to_string(),
        }))
        .await;
    }

    /// Unsubscribe a remote track.
    pub async fn remove_track(&self, track_id: &str) {
        self.emit(ProviderEvent::TrackUnsubscribed {
            track_id: track_id.to_string(),
        })
        .await;
    }

    /// Simulate the provider dropping the session.
    pub async fn drop_connection(&self, reason: &str) {
        self.emit(ProviderEvent::Disconnected {
            reason: reason.to_string(),
        })
        .await;
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_publishing(&self) -> bool {
        self.state.publishing.load(Ordering::SeqCst)
    }

    /// Token the connection was opened with.
    pub fn token(&self) -> &str {
        &self.token
    }
}

struct MockSession {
    state: Arc<MockSessionState>,
    deny_microphone: bool,
    publish_delay: Option<Duration>,
}

#[async_trait]
impl ProviderSession for MockSession {
    async fn publish_microphone(&mut self) -> Result<(), ProviderError> {
        if let Some(delay) = self.publish_delay {
            tokio::time::sleep(delay).await;
        }
        if self.deny_microphone {
            return Err(ProviderError::PermissionDenied(
                "Mock microphone denied".to_string(),
            ));
        }
        self.state.publishing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unpublish_microphone(&mut self) -> Result<(), ProviderError> {
        self.state.publishing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.publishing.store(false, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

/// Mock streaming provider.
pub struct MockStreamingProvider {
    /// Behaviors for the first calls, in order.
    script: Vec<ConnectBehavior>,
    /// Behavior once the script is exhausted.
    fallback: ConnectBehavior,
    call_count: AtomicUsize,
    connections: Mutex<Vec<MockConnectionControl>>,
}

impl MockStreamingProvider {
    /// Create a mock that always opens a session.
    pub fn accepting() -> Self {
        Self::with_script(Vec::new(), ConnectBehavior::Accept)
    }

    /// Create a mock whose every connect fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::with_script(Vec::new(), ConnectBehavior::Fail(error))
    }

    /// Create a mock that follows `script`, then `fallback`.
    pub fn with_script(script: Vec<ConnectBehavior>, fallback: ConnectBehavior) -> Self {
        Self {
            script,
            fallback,
            call_count: AtomicUsize::new(0),
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Get the number of connect calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The `index`th connection opened.
    pub fn connection(&self, index: usize) -> Option<MockConnectionControl> {
        lock(&self.connections).get(index).cloned()
    }

    /// The most recently opened connection.
    pub fn latest_connection(&self) -> Option<MockConnectionControl> {
        lock(&self.connections).last().cloned()
    }

    /// All connections opened so far.
    pub fn connections(&self) -> Vec<MockConnectionControl> {
        lock(&self.connections).clone()
    }

    fn open(
        &self,
        token: &SecretString,
        deny_microphone: bool,
        publish_delay: Option<Duration>,
    ) -> ProviderConnection {
        use common::secret::ExposeSecret;

        let (events_tx, events_rx) = mpsc::channel(MOCK_EVENT_BUFFER);
        let state = Arc::new(MockSessionState::default());

        lock(&self.connections).push(MockConnectionControl {
            events: events_tx,
            state: Arc::clone(&state),
            token: token.expose_secret().to_string(),
        });

        ProviderConnection {
            session: Box::new(MockSession {
                state,
                deny_microphone,
                publish_delay,
            }),
            events: events_rx,
        }
    }
}

#[async_trait]
impl StreamingProvider for MockStreamingProvider {
    async fn connect(
        &self,
        _url: &str,
        token: &SecretString,
    ) -> Result<ProviderConnection, ProviderError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .script
            .get(count)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        match behavior {
            ConnectBehavior::Accept => Ok(self.open(token, false, None)),
            ConnectBehavior::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.open(token, false, None))
            }
            ConnectBehavior::Fail(error) => Err(error),
            ConnectBehavior::DenyMicrophone => Ok(self.open(token, true, None)),
            ConnectBehavior::SlowMicrophone(delay) => Ok(self.open(token, false, Some(delay))),
        }
    }
}

/// Observable state of one mock playback element.
#[derive(Debug)]
pub struct MockElementState {
    pub track_id: String,
    muted: AtomicBool,
    volume_bits: AtomicU32,
    released: AtomicBool,
}

impl MockElementState {
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::SeqCst))
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

struct MockElement {
    state: Arc<MockElementState>,
}

impl PlaybackElement for MockElement {
    fn set_muted(&mut self, muted: bool) {
        self.state.muted.store(muted, Ordering::SeqCst);
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.volume_bits.store(volume.to_bits(), Ordering::SeqCst);
    }

    fn release(&mut self) {
        self.state.released.store(true, Ordering::SeqCst);
    }
}

/// Mock audio output.
#[derive(Default)]
pub struct MockAudioOutput {
    elements: Mutex<Vec<Arc<MockElementState>>>,
}

impl MockAudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `index`th element ever attached.
    pub fn element(&self, index: usize) -> Option<Arc<MockElementState>> {
        lock(&self.elements).get(index).cloned()
    }

    /// Every element ever attached, in order.
    pub fn elements(&self) -> Vec<Arc<MockElementState>> {
        lock(&self.elements).clone()
    }

    /// Elements attached and not yet released.
    pub fn attached_count(&self) -> usize {
        lock(&self.elements)
            .iter()
            .filter(|element| !element.is_released())
            .count()
    }
}

impl AudioOutput for MockAudioOutput {
    fn attach(&self, track: &RemoteTrack) -> Box<dyn PlaybackElement> {
        let state = Arc::new(MockElementState {
            track_id: track.track_id.clone(),
            muted: AtomicBool::new(false),
            volume_bits: AtomicU32::new(1.0_f32.to_bits()),
            released: AtomicBool::new(false),
        });
        lock(&self.elements).push(Arc::clone(&state));
        Box::new(MockElement { state })
    }
}
