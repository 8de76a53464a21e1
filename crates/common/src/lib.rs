//! Common utilities and types shared across Babel Booth components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for the room and identity naming convention
pub mod rooms;

/// Module for access token claims (room grants, lifetimes, size limits)
pub mod grants;
