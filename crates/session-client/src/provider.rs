//! Seams to the streaming provider's SDK and the local audio output.
//!
//! Media transport, track negotiation and room state live entirely behind
//! these traits. The session actor only sees lifecycle events and opaque
//! playback elements.

use crate::error::ProviderError;
use async_trait::async_trait;
use common::secret::SecretString;
use tokio::sync::mpsc;

/// A remote audio track offered by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    /// Provider-assigned track id, unique within a connection.
    pub track_id: String,
    /// Identity of the publishing participant.
    pub participant: String,
}

/// Lifecycle events emitted by an open provider session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    ParticipantJoined { identity: String },
    ParticipantLeft { identity: String },
    TrackSubscribed(RemoteTrack),
    TrackUnsubscribed { track_id: String },
    /// The provider ended the session on its own.
    Disconnected { reason: String },
}

/// An open provider session.
#[async_trait]
pub trait ProviderSession: Send {
    /// Capture and publish the local microphone track.
    async fn publish_microphone(&mut self) -> Result<(), ProviderError>;

    /// Stop and unpublish the local microphone track.
    async fn unpublish_microphone(&mut self) -> Result<(), ProviderError>;

    /// Leave the room. Idempotent.
    async fn close(&mut self);
}

/// Result of a successful connect: the session and its event stream.
pub struct ProviderConnection {
    pub session: Box<dyn ProviderSession>,
    pub events: mpsc::Receiver<ProviderEvent>,
}

impl std::fmt::Debug for ProviderConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConnection").finish_non_exhaustive()
    }
}

/// Entry point to the provider SDK.
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Open a session at `url` authenticated by `token`.
    async fn connect(&self, url: &str, token: &SecretString)
        -> Result<ProviderConnection, ProviderError>;
}

/// Local audio sink for remote tracks.
pub trait AudioOutput: Send + Sync {
    /// Create a playback element for `track`.
    fn attach(&self, track: &RemoteTrack) -> Box<dyn PlaybackElement>;
}

/// One attached playback element.
pub trait PlaybackElement: Send {
    fn set_muted(&mut self, muted: bool);

    /// `volume` is already clamped to `[0.0, 1.0]`.
    fn set_volume(&mut self, volume: f32);

    /// Detach from the track and free the element.
    fn release(&mut self);
}
