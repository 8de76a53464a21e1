//! Session lifecycle tests against mock collaborators.
//!
//! Time is paused, so retry delays elapse as soon as every task is idle.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::rooms::{Language, RoleTag};
use session_client::error::{CredentialError, ProviderError};
use session_client::mock::{
    ConnectBehavior, MockAudioOutput, MockCredentialSource, MockStreamingProvider,
};
use session_client::provider::ProviderEvent;
use session_client::{
    ConnectTarget, SessionActor, SessionConfig, SessionError, SessionHandle, SessionState,
    SessionStatus,
};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    handle: SessionHandle,
    credentials: Arc<MockCredentialSource>,
    provider: Arc<MockStreamingProvider>,
    audio: Arc<MockAudioOutput>,
}

impl Harness {
    fn new(credentials: MockCredentialSource, provider: MockStreamingProvider) -> Self {
        Self::with_config(SessionConfig::default(), credentials, provider)
    }

    fn listening(provider: MockStreamingProvider) -> Self {
        Self::new(MockCredentialSource::accepting(), provider)
    }

    fn with_config(
        config: SessionConfig,
        credentials: MockCredentialSource,
        provider: MockStreamingProvider,
    ) -> Self {
        let credentials = Arc::new(credentials);
        let provider = Arc::new(provider);
        let audio = Arc::new(MockAudioOutput::new());
        let (handle, _task) = SessionActor::spawn(
            config,
            credentials.clone(),
            provider.clone(),
            audio.clone(),
        );
        Self {
            handle,
            credentials,
            provider,
            audio,
        }
    }

    async fn wait_until(&self, predicate: impl FnMut(&SessionStatus) -> bool) -> SessionStatus {
        let mut rx = self.handle.subscribe();
        let status = rx.wait_for(predicate).await.unwrap().clone();
        status
    }

    async fn wait_for_state(&self, state: SessionState) -> SessionStatus {
        self.wait_until(|s| s.state == state).await
    }

    /// Let every task run and any pending retry delay elapse.
    async fn settle(&self) {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
}

fn network_down() -> ProviderError {
    ProviderError::Network("connection refused".to_string())
}

#[tokio::test(start_paused = true)]
async fn test_korean_listener_from_menu_code() {
    let h = Harness::listening(MockStreamingProvider::accepting());

    h.handle
        .connect(ConnectTarget::listener_from_menu_code("kr").unwrap())
        .await
        .unwrap();
    let status = h.wait_for_state(SessionState::Connected).await;

    assert_eq!(status.title().as_deref(), Some("韩语 / Korean"));
    assert_eq!(status.room.as_deref(), Some("room-kr"));
    assert_eq!(status.language, Some(Language::Korean));

    let requests = h.credentials.requests();
    let request = requests.first().unwrap();
    assert_eq!(request.room.as_str(), "room-kr");
    assert_eq!(request.identity.role_tag(), RoleTag::Audience);
    assert!(request.identity.as_str().starts_with("audience-"));
    assert!(!request.is_publisher);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_releases_every_element() {
    let h = Harness::listening(MockStreamingProvider::accepting());

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    let connection = h.provider.latest_connection().unwrap();
    for (track, participant) in [
        ("TR_1", "interpreter-en-1"),
        ("TR_2", "interpreter-en-2"),
        ("TR_3", "interpreter-en-3"),
    ] {
        connection.add_track(track, participant).await;
    }
    h.wait_until(|s| s.attached_tracks == 3).await;
    assert_eq!(h.audio.attached_count(), 3);

    h.handle.disconnect().await.unwrap();

    let status = h.handle.status();
    assert_eq!(status.state, SessionState::Disconnected);
    assert_eq!(status.attached_tracks, 0);
    assert_eq!(h.audio.attached_count(), 0);
    assert!(h.audio.elements().iter().all(|e| e.is_released()));
    assert!(connection.is_closed());
    assert_eq!(status.last_failure, None);
}

#[tokio::test(start_paused = true)]
async fn test_mute_applies_to_later_tracks() {
    let h = Harness::listening(MockStreamingProvider::accepting());

    h.handle
        .connect(ConnectTarget::listener(Language::Vietnamese))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    let connection = h.provider.latest_connection().unwrap();
    connection.add_track("TR_1", "interpreter-vn-1").await;
    connection.add_track("TR_2", "interpreter-vn-2").await;
    h.wait_until(|s| s.attached_tracks == 2).await;

    assert!(h.handle.toggle_mute().await.unwrap());
    assert_eq!(h.handle.set_volume(0.5).await.unwrap(), 0.5);

    connection.add_track("TR_3", "interpreter-vn-3").await;
    h.wait_until(|s| s.attached_tracks == 3).await;

    for element in h.audio.elements() {
        assert!(element.is_muted(), "{} should be muted", element.track_id);
        assert_eq!(element.volume(), 0.5);
    }

    assert!(!h.handle.toggle_mute().await.unwrap());
    assert!(h.audio.elements().iter().all(|e| !e.is_muted()));
}

#[tokio::test(start_paused = true)]
async fn test_track_unsubscribe_releases_element() {
    let h = Harness::listening(MockStreamingProvider::accepting());

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    let connection = h.provider.latest_connection().unwrap();
    connection.add_track("TR_1", "interpreter-en-1").await;
    connection.add_track("TR_2", "interpreter-en-2").await;
    h.wait_until(|s| s.attached_tracks == 2).await;

    connection.remove_track("TR_1").await;
    h.wait_until(|s| s.attached_tracks == 1).await;

    assert!(h.audio.element(0).unwrap().is_released());
    assert!(!h.audio.element(1).unwrap().is_released());
}

#[tokio::test(start_paused = true)]
async fn test_participants_are_counted() {
    let h = Harness::listening(MockStreamingProvider::accepting());

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    let connection = h.provider.latest_connection().unwrap();
    for identity in ["interpreter-en-1", "audience-2"] {
        connection
            .emit(ProviderEvent::ParticipantJoined {
                identity: identity.to_string(),
            })
            .await;
    }
    connection
        .emit(ProviderEvent::ParticipantLeft {
            identity: "audience-2".to_string(),
        })
        .await;

    let status = h.wait_until(|s| s.participants == 1).await;
    assert_eq!(status.state, SessionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_budget_is_exhausted_after_five_attempts() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![ConnectBehavior::Accept],
        ConnectBehavior::Fail(network_down()),
    ));

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    h.provider
        .latest_connection()
        .unwrap()
        .drop_connection("signal lost")
        .await;

    let status = h.wait_for_state(SessionState::Disconnected).await;

    // One initial connect plus five reconnects.
    assert_eq!(h.provider.call_count(), 6);
    assert_eq!(h.credentials.call_count(), 6);
    assert_eq!(status.attempt, 5);
    assert!(matches!(status.last_failure, Some(SessionError::Transport(_))));

    h.settle().await;
    assert_eq!(h.provider.call_count(), 6);
    assert_eq!(h.handle.status().state, SessionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_succeeds_within_budget() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![
            ConnectBehavior::Accept,
            ConnectBehavior::Fail(network_down()),
            ConnectBehavior::Fail(network_down()),
        ],
        ConnectBehavior::Accept,
    ));

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    let first = h.provider.latest_connection().unwrap();
    first.drop_connection("signal lost").await;
    h.wait_for_state(SessionState::Reconnecting).await;

    let status = h.wait_for_state(SessionState::Connected).await;
    assert_eq!(status.attempt, 0);
    assert_eq!(status.last_failure, None);
    assert_eq!(h.provider.call_count(), 4);
    assert!(first.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_retry_delay_is_respected() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![ConnectBehavior::Fail(network_down())],
        ConnectBehavior::Accept,
    ));

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Reconnecting).await;
    let failed_at = tokio::time::Instant::now();

    h.wait_for_state(SessionState::Connected).await;
    assert!(failed_at.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_each_attempt_fetches_a_fresh_credential() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![
            ConnectBehavior::Fail(ProviderError::Sdk("signal timeout".to_string())),
            ConnectBehavior::Fail(network_down()),
        ],
        ConnectBehavior::Accept,
    ));

    h.handle
        .connect(ConnectTarget::listener(Language::Indonesian))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    assert_eq!(h.credentials.call_count(), 3);
    assert_eq!(h.provider.connections().len(), 1);
    assert_eq!(h.provider.latest_connection().unwrap().token(), "mock-token-2");
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_retry_delay_cancels_retry() {
    let h = Harness::listening(MockStreamingProvider::failing(network_down()));

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Reconnecting).await;

    h.handle.disconnect().await.unwrap();
    h.settle().await;

    let status = h.handle.status();
    assert_eq!(status.state, SessionState::Disconnected);
    assert_eq!(status.attempt, 0);
    assert_eq!(status.last_failure, None);
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_slow_connect_never_revives() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![ConnectBehavior::AcceptAfter(Duration::from_secs(5))],
        ConnectBehavior::Accept,
    ));

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.handle.disconnect().await.unwrap();
    h.settle().await;

    assert_eq!(h.handle.status().state, SessionState::Disconnected);
    assert!(h.provider.connections().iter().all(|c| c.is_closed()));
}

#[tokio::test(start_paused = true)]
async fn test_custom_retry_budget() {
    let h = Harness::with_config(
        SessionConfig::default()
            .with_max_attempts(2)
            .with_retry_delay(Duration::from_millis(100)),
        MockCredentialSource::accepting(),
        MockStreamingProvider::failing(network_down()),
    );

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    let status = h.wait_for_state(SessionState::Disconnected).await;

    assert_eq!(h.provider.call_count(), 3);
    assert_eq!(status.attempt, 2);
}

#[tokio::test(start_paused = true)]
async fn test_credential_rejection_is_fatal() {
    let h = Harness::new(
        MockCredentialSource::rejecting(400),
        MockStreamingProvider::accepting(),
    );

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    let status = h.wait_for_state(SessionState::Disconnected).await;

    assert!(matches!(status.last_failure, Some(SessionError::Validation(_))));
    assert_eq!(h.credentials.call_count(), 1);
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_microphone_denied_is_fatal() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![ConnectBehavior::DenyMicrophone],
        ConnectBehavior::Accept,
    ));

    h.handle
        .connect(ConnectTarget::interpreter(Language::Korean))
        .await
        .unwrap();
    let status = h.wait_for_state(SessionState::Disconnected).await;

    assert!(matches!(status.last_failure, Some(SessionError::Permission(_))));
    assert_eq!(h.provider.call_count(), 1);
    assert!(h.provider.connection(0).unwrap().is_closed());

    h.settle().await;
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interpreter_publishes_and_stops() {
    let h = Harness::listening(MockStreamingProvider::accepting());

    h.handle
        .connect(ConnectTarget::interpreter(Language::Korean))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    let request = h.credentials.requests().first().cloned().unwrap();
    assert!(request.is_publisher);
    assert_eq!(request.identity.role_tag(), RoleTag::Interpreter);

    let connection = h.provider.latest_connection().unwrap();
    assert!(connection.is_publishing());

    // Publishers never attach remote audio.
    connection.add_track("TR_other", "interpreter-kr-2").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.audio.attached_count(), 0);

    h.handle.stop_publishing().await.unwrap();

    assert_eq!(h.handle.status().state, SessionState::Disconnected);
    assert!(!connection.is_publishing());
    assert!(connection.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_mute_and_volume_survive_reconnect() {
    let h = Harness::listening(MockStreamingProvider::accepting());

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Connected).await;

    let first = h.provider.latest_connection().unwrap();
    first.add_track("TR_1", "interpreter-en-1").await;
    h.wait_until(|s| s.attached_tracks == 1).await;

    h.handle.toggle_mute().await.unwrap();
    h.handle.set_volume(0.3).await.unwrap();

    first.drop_connection("network change").await;
    let status = h.wait_for_state(SessionState::Reconnecting).await;
    assert_eq!(status.attached_tracks, 0);
    assert!(h.audio.element(0).unwrap().is_released());

    h.wait_for_state(SessionState::Connected).await;
    let second = h.provider.latest_connection().unwrap();
    second.add_track("TR_1b", "interpreter-en-1").await;
    h.wait_until(|s| s.attached_tracks == 1).await;

    let element = h.audio.element(1).unwrap();
    assert!(element.is_muted());
    assert_eq!(element.volume(), 0.3);

    let status = h.handle.status();
    assert!(status.muted);
    assert_eq!(status.volume, 0.3);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_after_give_up() {
    let h = Harness::new(
        MockCredentialSource::with_responses(vec![
            Err(CredentialError::Rejected {
                status: 400,
                message: "Missing required parameter 'room'".to_string(),
            }),
            Ok(()),
        ]),
        MockStreamingProvider::accepting(),
    );

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    h.wait_for_state(SessionState::Disconnected).await;

    h.handle
        .connect(ConnectTarget::listener(Language::Korean))
        .await
        .unwrap();
    let status = h.wait_for_state(SessionState::Connected).await;

    assert_eq!(status.room.as_deref(), Some("room-kr"));
    assert_eq!(status.last_failure, None);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_while_publishing_closes_session() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![ConnectBehavior::SlowMicrophone(Duration::from_secs(5))],
        ConnectBehavior::Accept,
    ));

    h.handle
        .connect(ConnectTarget::interpreter(Language::Korean))
        .await
        .unwrap();

    // The session is open and waiting on the microphone.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let connection = h.provider.latest_connection().unwrap();
    assert!(!connection.is_closed());

    h.handle.disconnect().await.unwrap();
    h.settle().await;

    assert_eq!(h.handle.status().state, SessionState::Disconnected);
    assert!(connection.is_closed());
    assert_eq!(connection.close_calls(), 1);
    assert!(!connection.is_publishing());
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_publishing_closes_session() {
    let h = Harness::listening(MockStreamingProvider::with_script(
        vec![ConnectBehavior::SlowMicrophone(Duration::from_secs(5))],
        ConnectBehavior::Accept,
    ));

    h.handle
        .connect(ConnectTarget::interpreter(Language::Vietnamese))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    h.handle.shutdown();
    h.settle().await;

    let connection = h.provider.latest_connection().unwrap();
    assert!(connection.is_closed());
    assert!(!connection.is_publishing());
}

#[tokio::test(start_paused = true)]
async fn test_credential_transport_failure_is_retried() {
    let h = Harness::new(
        MockCredentialSource::with_responses(vec![
            Err(CredentialError::Transport("issuer unreachable".to_string())),
            Ok(()),
        ]),
        MockStreamingProvider::accepting(),
    );

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();

    let status = h.wait_for_state(SessionState::Reconnecting).await;
    assert!(matches!(status.last_failure, Some(SessionError::Transport(_))));
    assert_eq!(h.provider.call_count(), 0);

    let status = h.wait_for_state(SessionState::Connected).await;
    assert_eq!(status.last_failure, None);
    assert_eq!(h.credentials.call_count(), 2);
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_credential_transport_failures_exhaust_budget() {
    let h = Harness::new(
        MockCredentialSource::with_responses(vec![Err(CredentialError::Transport(
            "issuer unreachable".to_string(),
        ))]),
        MockStreamingProvider::accepting(),
    );

    h.handle
        .connect(ConnectTarget::listener(Language::English))
        .await
        .unwrap();
    let status = h.wait_for_state(SessionState::Disconnected).await;

    // Initial attempt plus five retries, none reaching the provider.
    assert_eq!(h.credentials.call_count(), 6);
    assert_eq!(h.provider.call_count(), 0);
    assert_eq!(status.attempt, 5);
    assert!(matches!(status.last_failure, Some(SessionError::Transport(_))));

    h.settle().await;
    assert_eq!(h.credentials.call_count(), 6);
}
