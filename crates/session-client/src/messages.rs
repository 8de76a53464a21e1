//! Types exchanged between a [`SessionHandle`](crate::actor::SessionHandle)
//! and its actor.

use crate::credentials::CredentialRequest;
use crate::error::SessionError;
use crate::state::SessionState;
use common::rooms::{Identity, Language, RoomName};
use tokio::sync::oneshot;

/// Whether the session listens or publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Subscribes to and plays remote audio.
    Listener,
    /// Publishes the local microphone.
    Publisher,
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub room: RoomName,
    pub identity: Identity,
    pub role: Role,
}

impl ConnectTarget {
    #[must_use]
    pub fn new(room: RoomName, identity: Identity, role: Role) -> Self {
        Self {
            room,
            identity,
            role,
        }
    }

    /// Audience member listening to `language`.
    #[must_use]
    pub fn listener(language: Language) -> Self {
        Self::new(
            language.room_name(),
            Identity::audience_now(),
            Role::Listener,
        )
    }

    /// Listener target from a menu code such as a `?lang=` URL parameter.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Validation` for an unknown code.
    pub fn listener_from_menu_code(code: &str) -> Result<Self, SessionError> {
        let language =
            Language::from_menu_code(code).map_err(|e| SessionError::Validation(e.to_string()))?;
        Ok(Self::listener(language))
    }

    /// Interpreter publishing into `language`'s room.
    #[must_use]
    pub fn interpreter(language: Language) -> Self {
        Self::new(
            language.room_name(),
            Identity::interpreter_now(language),
            Role::Publisher,
        )
    }

    /// Fixed publisher role with a stable identity.
    #[must_use]
    pub fn named_publisher(room: RoomName, name: &str) -> Self {
        Self::new(room, Identity::named_interpreter(name), Role::Publisher)
    }

    #[must_use]
    pub fn is_publisher(&self) -> bool {
        self.role == Role::Publisher
    }

    pub(crate) fn credential_request(&self) -> CredentialRequest {
        CredentialRequest {
            room: self.room.clone(),
            identity: self.identity.clone(),
            is_publisher: self.is_publisher(),
        }
    }
}

/// Snapshot of a session, published after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Current attempt within a reconnect cycle; 0 when connected.
    pub attempt: u32,
    pub muted: bool,
    /// Playback volume in `[0.0, 1.0]`.
    pub volume: f32,
    /// Playback elements currently attached.
    pub attached_tracks: usize,
    /// Remote participants currently in the room.
    pub participants: usize,
    /// Room of the current or last target.
    pub room: Option<String>,
    /// Language served by that room, if conventional.
    pub language: Option<Language>,
    /// Most recent failure, cleared on success or user disconnect.
    pub last_failure: Option<SessionError>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            attempt: 0,
            muted: false,
            volume: 1.0,
            attached_tracks: 0,
            participants: 0,
            room: None,
            language: None,
            last_failure: None,
        }
    }
}

impl SessionStatus {
    /// Display title, e.g. `韩语 / Korean`.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.language
            .map(|language| format!("{} / {}", language.title_zh(), language.title_en()))
    }
}

/// Commands sent from the handle to the actor.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Connect {
        target: ConnectTarget,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },
    Disconnect {
        respond_to: oneshot::Sender<()>,
    },
    StopPublishing {
        respond_to: oneshot::Sender<()>,
    },
    ToggleMute {
        respond_to: oneshot::Sender<bool>,
    },
    SetVolume {
        volume: f32,
        respond_to: oneshot::Sender<f32>,
    },
}
