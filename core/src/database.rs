//! User database contract.
//!
//! The authentication layer talks to storage exclusively through
//! [`UserDatabase`]. Backends (PostgreSQL, the in-memory mock) implement it;
//! callers stay generic over the trait.
//!
//! Absence is not an error: lookups return `Ok(None)` when nothing matches.

use crate::error::Result;
use crate::models::{User, UserId};
use std::future::Future;

/// User database.
///
/// CRUD over users plus lookup by email and by linked OAuth account.
pub trait UserDatabase: Send + Sync {
    /// Get user by ID, with linked OAuth accounts when the backend stores them.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn get(&self, id: UserId) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Get user by email, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn get_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Get the user owning the account `account_id` at provider `oauth_name`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No OAuth account table is configured → `UserDbError::OAuthAccountTableNotSet`
    /// - Database query fails
    fn get_by_oauth_account(
        &self,
        oauth_name: &str,
        account_id: &str,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Create user together with its OAuth accounts.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - User fails validation → `UserDbError::InvalidUser`
    /// - User is an OAuth user but no OAuth account table is configured
    ///   → `UserDbError::OAuthAccountTableNotSet`
    /// - Email already exists → `UserDbError::EmailAlreadyExists`
    /// - OAuth account already linked → `UserDbError::ConstraintViolation`
    /// - Database query fails
    fn create(&self, user: &User) -> impl Future<Output = Result<User>> + Send;

    /// Update user. For an OAuth user (`oauth_accounts` is `Some`), the
    /// linked accounts are replaced by the record's list; a plain user's
    /// update leaves linked accounts untouched.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - User fails validation → `UserDbError::InvalidUser`
    /// - User is an OAuth user but no OAuth account table is configured
    ///   → `UserDbError::OAuthAccountTableNotSet`
    /// - User not found → `UserDbError::UserNotFound`
    /// - Email taken by another user → `UserDbError::EmailAlreadyExists`
    /// - Database query fails
    fn update(&self, user: &User) -> impl Future<Output = Result<User>> + Send;

    /// Delete user and its linked OAuth accounts. Deleting a missing user
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn delete(&self, user: &User) -> impl Future<Output = Result<()>> + Send;
}
