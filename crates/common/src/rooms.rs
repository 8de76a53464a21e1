//! Room and identity naming convention.
//!
//! Listeners and interpreters meet in the provider room for their language.
//! Both sides derive the room name from the same [`Language`] table:
//!
//! ```text
//! menu code   room segment   room name
//! en          en             room-en
//! vi (or vn)  vn             room-vn
//! id          id             room-id
//! kr (or ko)  kr             room-kr
//! ```
//!
//! Vietnamese is the one language whose front-end menu code (`vi`) differs
//! from its room segment (`vn`). Deployed rooms already use `room-vn`, so
//! both spellings are accepted on input and the segment is always `vn`.
//!
//! The issuer treats room names and identities as opaque; this module is
//! the client-side vocabulary only.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix shared by every convention-conforming room name.
pub const ROOM_PREFIX: &str = "room-";

/// Role tag for listener identities.
pub const AUDIENCE_TAG: &str = "audience";

/// Role tag for publisher identities.
pub const INTERPRETER_TAG: &str = "interpreter";

/// Errors from parsing naming-convention values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// Menu code or room segment is not one of the supported languages.
    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),

    /// Room name does not start with `room-`.
    #[error("Room name does not follow the room-<lang> convention: {0}")]
    NotConventional(String),
}

/// A supported interpretation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Vietnamese,
    Indonesian,
    Korean,
}

impl Language {
    /// All supported languages, in menu order.
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Vietnamese,
        Language::Indonesian,
        Language::Korean,
    ];

    /// Resolve a front-end menu value or room segment.
    ///
    /// Accepts `vi` and `vn` for Vietnamese, and `kr` and `ko` for Korean.
    /// Matching is case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns `NamingError::UnsupportedLanguage` for any other code.
    pub fn from_menu_code(code: &str) -> Result<Self, NamingError> {
        match code {
            "en" => Ok(Language::English),
            "vi" | "vn" => Ok(Language::Vietnamese),
            "id" => Ok(Language::Indonesian),
            "kr" | "ko" => Ok(Language::Korean),
            other => Err(NamingError::UnsupportedLanguage(other.to_string())),
        }
    }

    /// Value used by the listener page's language menu.
    #[must_use]
    pub fn menu_code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Vietnamese => "vi",
            Language::Indonesian => "id",
            Language::Korean => "kr",
        }
    }

    /// Segment used inside the room name. Never the menu code for Vietnamese.
    #[must_use]
    pub fn room_segment(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Vietnamese => "vn",
            Language::Indonesian => "id",
            Language::Korean => "kr",
        }
    }

    /// The provider room for this language, e.g. `room-kr`.
    #[must_use]
    pub fn room_name(self) -> RoomName {
        RoomName(format!("{ROOM_PREFIX}{}", self.room_segment()))
    }

    /// Title shown on the listener page.
    #[must_use]
    pub fn title_zh(self) -> &'static str {
        match self {
            Language::English => "英语",
            Language::Vietnamese => "越南语",
            Language::Indonesian => "印尼语",
            Language::Korean => "韩语",
        }
    }

    #[must_use]
    pub fn title_en(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Vietnamese => "Vietnamese",
            Language::Indonesian => "Indonesian",
            Language::Korean => "Korean",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title_en())
    }
}

impl FromStr for Language {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_menu_code(s)
    }
}

/// A provider room name.
///
/// Any string can be wrapped with [`RoomName::new`]; [`RoomName::language`]
/// reports whether it follows the `room-<segment>` convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

impl RoomName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Parse a conventional room name.
    ///
    /// # Errors
    ///
    /// - `NotConventional` if the `room-` prefix is missing
    /// - `UnsupportedLanguage` if the segment is unknown
    pub fn parse(name: &str) -> Result<Self, NamingError> {
        let segment = name
            .strip_prefix(ROOM_PREFIX)
            .ok_or_else(|| NamingError::NotConventional(name.to_string()))?;
        let room = Self(name.to_string());
        match room.language() {
            Some(_) => Ok(room),
            None => Err(NamingError::UnsupportedLanguage(segment.to_string())),
        }
    }

    /// Language this room serves, if the name is conventional.
    ///
    /// Only room segments are recognized here, so `room-vi` is not a
    /// conventional room even though `vi` is a valid menu code.
    #[must_use]
    pub fn language(&self) -> Option<Language> {
        let segment = self.0.strip_prefix(ROOM_PREFIX)?;
        Language::ALL
            .into_iter()
            .find(|lang| lang.room_segment() == segment)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role encoded in an identity's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTag {
    Audience,
    Interpreter,
    /// Tag not produced by this convention.
    Other,
}

/// A participant identity, opaque to the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Wrap an identity received from elsewhere.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// `audience-<ts>`
    #[must_use]
    pub fn audience(ts: i64) -> Self {
        Self(format!("{AUDIENCE_TAG}-{ts}"))
    }

    /// `audience-<now in epoch millis>`
    #[must_use]
    pub fn audience_now() -> Self {
        Self::audience(chrono::Utc::now().timestamp_millis())
    }

    /// `interpreter-<segment>-<ts>`
    #[must_use]
    pub fn interpreter(language: Language, ts: i64) -> Self {
        Self(format!(
            "{INTERPRETER_TAG}-{}-{ts}",
            language.room_segment()
        ))
    }

    /// `interpreter-<segment>-<now in ms>`
    #[must_use]
    pub fn interpreter_now(language: Language) -> Self {
        Self::interpreter(language, chrono::Utc::now().timestamp_millis())
    }

    /// `interpreter-<name>` for a fixed publisher role.
    #[must_use]
    pub fn named_interpreter(name: &str) -> Self {
        Self(format!("{INTERPRETER_TAG}-{name}"))
    }

    #[must_use]
    pub fn role_tag(&self) -> RoleTag {
        match self.0.split_once('-') {
            Some((AUDIENCE_TAG, _)) => RoleTag::Audience,
            Some((INTERPRETER_TAG, _)) => RoleTag::Interpreter,
            _ => RoleTag::Other,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
