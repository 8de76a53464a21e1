//! Token Service Library
//!
//! Mints short-lived access tokens that admit one participant identity into
//! one streaming room, as listener or as publisher.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Token signing and verification
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP middleware
//! - `models` - Request and response models
//! - `observability` - Metrics and log correlation helpers
//! - `routes` - Router and application state
//! - `services` - Token issuance

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
