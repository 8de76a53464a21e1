//! Session client error types.
//!
//! Collaborator errors ([`CredentialError`], [`ProviderError`]) are folded
//! into [`SessionError`], whose kind decides whether a failed connect
//! attempt is retried.

use crate::state::SessionState;
use thiserror::Error;

/// Errors surfaced by a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The issuer rejected the request, or the input was malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Network failure or server-side fault while fetching a credential
    /// or opening the provider session.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Microphone access was denied.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Any other provider SDK failure.
    #[error("Provider failure: {0}")]
    Provider(String),

    /// The requested input is not valid in the current state.
    #[error("Cannot {input} while {from}")]
    InvalidTransition {
        from: SessionState,
        input: &'static str,
    },

    /// The session actor has stopped.
    #[error("Session is closed")]
    Closed,
}

impl SessionError {
    /// Whether a connect attempt failing with this error may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Transport(_) | SessionError::Provider(_))
    }

    /// Bounded label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Validation(_) => "validation",
            SessionError::Transport(_) => "transport",
            SessionError::Permission(_) => "permission",
            SessionError::Provider(_) => "provider",
            SessionError::InvalidTransition { .. } => "invalid_transition",
            SessionError::Closed => "closed",
        }
    }
}

/// Errors from a [`CredentialSource`](crate::credentials::CredentialSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The issuer answered 4xx.
    #[error("Issuer rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network error, timeout or 5xx.
    #[error("Issuer unreachable: {0}")]
    Transport(String),

    /// The issuer answered 2xx with an unreadable body.
    #[error("Invalid issuer response: {0}")]
    InvalidResponse(String),
}

impl From<CredentialError> for SessionError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Rejected { .. } => SessionError::Validation(err.to_string()),
            CredentialError::Transport(_) | CredentialError::InvalidResponse(_) => {
                SessionError::Transport(err.to_string())
            }
        }
    }
}

/// Errors from a [`StreamingProvider`](crate::provider::StreamingProvider)
/// or its session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider endpoint could not be reached.
    #[error("Provider network error: {0}")]
    Network(String),

    /// Capture device access denied by the user or platform.
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    /// Any other SDK failure.
    #[error("Provider SDK error: {0}")]
    Sdk(String),
}

impl From<ProviderError> for SessionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Network(_) => SessionError::Transport(err.to_string()),
            ProviderError::PermissionDenied(_) => SessionError::Permission(err.to_string()),
            ProviderError::Sdk(_) => SessionError::Provider(err.to_string()),
        }
    }
}
