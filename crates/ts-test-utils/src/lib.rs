//! # Token Service Test Utilities
//!
//! Shared test utilities for the token service.
//!
//! This crate provides:
//! - Fixed credentials and identities for reproducible tests
//! - Request builders for `GET /token`
//! - Server test harness (`TestTokenServer` for E2E tests)
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ts_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestTokenServer::spawn().await?;
//!
//!     let response = TokenRequest::new("room-kr", TEST_AUDIENCE_ID)
//!         .send(&server.url())
//!         .await?;
//!
//!     response.token
//!         .assert_valid_jwt()
//!         .assert_for_room("room-kr")
//!         .assert_can_publish(false);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
