//! # userdb testing
//!
//! Testing utilities for code built on the `UserDatabase` contract.
//!
//! This crate provides:
//! - [`MockUserDatabase`], an in-memory backend
//! - Fixtures shared by unit and integration tests
//! - [`contract`] scenarios that every backend's test suite runs
//! - Tracing setup for test output
//!
//! ## Example
//!
//! ```ignore
//! use userdb_core::UserDatabase;
//! use userdb_testing::{MockUserDatabase, fixtures};
//!
//! #[tokio::test]
//! async fn test_signup() {
//!     let db = MockUserDatabase::with_oauth_accounts();
//!     let user = db.create(&fixtures::lancelot_with_oauth()).await.unwrap();
//!     assert!(db.get_by_oauth_account("service1", "user_oauth1").await.unwrap().is_some());
//! }
//! ```

pub mod contract;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used items
pub use mocks::MockUserDatabase;

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Filtered by `RUST_LOG` (default `debug`). Safe to call from every test:
/// only the first call installs the subscriber.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_valid_users() {
        assert!(fixtures::lancelot().validate().is_ok());
        assert!(fixtures::lancelot_with_oauth().validate().is_ok());
        assert_eq!(
            fixtures::lancelot_with_first_name().extra_field::<String>("first_name"),
            Some("Lancelot".to_string())
        );
    }

    #[test]
    fn test_fixture_ids_are_fresh() {
        assert_ne!(fixtures::lancelot().id, fixtures::lancelot().id);
        assert_ne!(fixtures::oauth_account1().id, fixtures::oauth_account1().id);
    }

    #[test]
    fn test_init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
        tracing::debug!("tracing initialised twice without panicking");
    }
}
