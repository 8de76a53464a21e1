//! Babel Booth Session Client
//!
//! Client-side session management for listening to or publishing a
//! live-interpretation channel:
//!
//! - Lifecycle state machine with bounded fixed-delay reconnect
//! - Fresh credential per attempt from the token service
//! - Playback element ownership with mute and volume control
//! - Microphone publishing for interpreter sessions
//!
//! # Architecture
//!
//! ```text
//! SessionHandle (cloneable, UI side)
//! └── SessionActor (one task per session, owns all state)
//!     ├── RetryTask (at most one; fetch credential -> connect -> publish)
//!     ├── ProviderSession + event stream (while connected)
//!     └── PlaybackElements keyed by track id
//! ```
//!
//! The streaming SDK and the audio sink are reached only through the
//! [`provider`] traits, so the state machine runs unchanged against the
//! in-memory implementations in [`mock`].
//!
//! # Modules
//!
//! - [`actor`] - Session actor and its handle
//! - [`state`] - Pure state machine and retry policy
//! - [`credentials`] - Credential source trait and HTTP implementation
//! - [`provider`] - Streaming provider and audio output seams
//! - [`config`] - Retry and transport settings

pub mod actor;
pub mod config;
pub mod credentials;
pub mod error;
pub mod messages;
pub mod mock;
pub mod provider;
mod retry;
pub mod state;

pub use actor::{SessionActor, SessionHandle};
pub use config::SessionConfig;
pub use credentials::{Credential, CredentialRequest, CredentialSource, HttpCredentialSource};
pub use error::{CredentialError, ProviderError, SessionError};
pub use messages::{ConnectTarget, Role, SessionStatus};
pub use state::{RetryPolicy, SessionState};
