//! Session client configuration.

use std::time::Duration;

/// Delay between automatic reconnect attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Reconnect attempts allowed after a failure before the session is abandoned.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Timeout for one credential request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry and transport settings for one session.
///
/// # Example
///
/// ```rust
/// use session_client::config::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_retry_delay(Duration::from_millis(500))
///     .with_max_attempts(3);
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Fixed delay before each automatic reconnect attempt.
    pub retry_delay: Duration,

    /// Maximum number of automatic reconnect attempts.
    pub max_attempts: u32,

    /// Timeout for credential requests.
    pub http_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Set the delay between reconnect attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the reconnect budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the credential request timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}
