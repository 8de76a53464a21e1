//! Session lifecycle state machine.
//!
//! ```text
//! Idle -> Connecting -> Connected -> Reconnecting <-> Connecting
//!                 \          \            \
//!                  +----------+------------+--> Disconnected
//! ```
//!
//! [`SessionState::on`] is a pure function: it decides the next state and
//! nothing else. Side effects (fetching credentials, releasing playback,
//! scheduling retries) belong to the session actor.

use crate::error::SessionError;
use std::fmt;

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, never connected.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// Live; the only state in which tracks play or publish.
    Connected,
    /// Waiting for the retry delay before the next attempt.
    Reconnecting,
    /// Ended by the user, a fatal failure, or an exhausted retry budget.
    Disconnected,
}

impl SessionState {
    /// Whether a provider session may exist or be in the making.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Connected | SessionState::Reconnecting
        )
    }

    /// Next state for `input`, or `None` if the input does not apply here.
    #[must_use]
    pub fn on(self, input: SessionInput) -> Option<SessionState> {
        use SessionInput as I;
        use SessionState as S;

        match (self, input) {
            (S::Idle | S::Disconnected, I::Connect) => Some(S::Connecting),
            (S::Connecting, I::AttemptSucceeded) => Some(S::Connected),
            (S::Connecting, I::AttemptFailed(FailureDisposition::Retry)) => Some(S::Reconnecting),
            (S::Connecting, I::AttemptFailed(FailureDisposition::GiveUp)) => {
                Some(S::Disconnected)
            }
            (S::Connected, I::ProviderDisconnected) => Some(S::Reconnecting),
            (S::Reconnecting, I::RetryTimerFired) => Some(S::Connecting),
            (S::Connecting | S::Connected | S::Reconnecting, I::Disconnect | I::StopPublishing) => {
                Some(S::Disconnected)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Whether a failed attempt leads to another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    Retry,
    GiveUp,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// User asked to connect.
    Connect,
    /// Credential fetched and provider session opened.
    AttemptSucceeded,
    /// Credential fetch or session establishment failed.
    AttemptFailed(FailureDisposition),
    /// Provider dropped the session without being asked to.
    ProviderDisconnected,
    /// Retry delay elapsed.
    RetryTimerFired,
    /// User pressed disconnect.
    Disconnect,
    /// Publisher stopped its stream.
    StopPublishing,
}

impl SessionInput {
    /// Short name for logs and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SessionInput::Connect => "connect",
            SessionInput::AttemptSucceeded => "complete an attempt",
            SessionInput::AttemptFailed(_) => "fail an attempt",
            SessionInput::ProviderDisconnected => "lose the provider",
            SessionInput::RetryTimerFired => "retry",
            SessionInput::Disconnect => "disconnect",
            SessionInput::StopPublishing => "stop publishing",
        }
    }
}

/// Fixed-delay retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Decide what follows a failed attempt.
    ///
    /// `attempt` is the number of the failed attempt within the current
    /// reconnect cycle: 0 for the initial connect, 1..=max for retries.
    #[must_use]
    pub fn after_failure(&self, error: &SessionError, attempt: u32) -> FailureDisposition {
        if error.is_retryable() && attempt < self.max_attempts {
            FailureDisposition::Retry
        } else {
            FailureDisposition::GiveUp
        }
    }
}
