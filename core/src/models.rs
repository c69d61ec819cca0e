//! User and OAuth account data models.
//!
//! These are the plain records exchanged with a [`UserDatabase`]. They carry
//! no storage concerns; backends map them to and from their own rows.
//!
//! [`UserDatabase`]: crate::database::UserDatabase

use crate::constants::{oauth_columns, user_columns};
use crate::error::{Result, UserDbError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for UserId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a linked OAuth account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OAuthAccountId(pub uuid::Uuid);

impl OAuthAccountId {
    /// Generate a new random `OAuthAccountId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for OAuthAccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for OAuthAccountId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OAuthAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// OAuth Accounts
// ═══════════════════════════════════════════════════════════════════════

/// An account at an external OAuth provider linked to a user.
///
/// `(oauth_name, account_id)` identifies the account globally: one provider
/// account can be linked to at most one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthAccount {
    /// Account link ID.
    pub id: OAuthAccountId,

    /// Provider name (e.g. "google", "github").
    pub oauth_name: String,

    /// Provider access token.
    pub access_token: String,

    /// Access token expiry as a unix timestamp in seconds.
    pub expires_at: Option<i64>,

    /// Provider refresh token.
    pub refresh_token: Option<String>,

    /// Account ID at the provider.
    pub account_id: String,

    /// Email the provider reports for the account.
    pub account_email: String,
}

impl OAuthAccount {
    /// Create a new OAuth account link with a fresh ID.
    #[must_use]
    pub fn new(
        oauth_name: impl Into<String>,
        access_token: impl Into<String>,
        account_id: impl Into<String>,
        account_email: impl Into<String>,
    ) -> Self {
        Self {
            id: OAuthAccountId::new(),
            oauth_name: oauth_name.into(),
            access_token: access_token.into(),
            expires_at: None,
            refresh_token: None,
            account_id: account_id.into(),
            account_email: account_email.into(),
        }
    }

    /// Set the access token expiry (unix seconds).
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Returns `true` if the access token has an expiry at or before `now`.
    ///
    /// Tokens without an expiry never expire.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now.timestamp())
    }

    /// Check field lengths against the storage limits.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError::InvalidUser`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        check_required("oauth_name", &self.oauth_name, oauth_columns::OAUTH_NAME_MAX_LEN)?;
        check_required("access_token", &self.access_token, oauth_columns::TOKEN_MAX_LEN)?;
        check_required("account_id", &self.account_id, oauth_columns::ACCOUNT_ID_MAX_LEN)?;
        check_required(
            "account_email",
            &self.account_email,
            oauth_columns::ACCOUNT_EMAIL_MAX_LEN,
        )?;
        if let Some(refresh_token) = &self.refresh_token {
            check_max_len("refresh_token", refresh_token, oauth_columns::TOKEN_MAX_LEN)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Users
// ═══════════════════════════════════════════════════════════════════════

/// A user record.
///
/// `oauth_accounts` distinguishes plain users (`None`) from OAuth users
/// (`Some`, possibly empty). Writing an OAuth user to a database without an
/// OAuth account table fails with [`UserDbError::OAuthAccountTableNotSet`].
/// Writing a plain user never touches linked accounts.
///
/// `extra` holds application-specific fields (first name, locale, ...)
/// that are stored alongside the fixed columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,

    /// Email address, stored as given. Compared case-insensitively.
    pub email: String,

    /// Password hash produced by the authentication layer.
    pub hashed_password: String,

    /// Whether the account may log in.
    pub is_active: bool,

    /// Whether the account has administrative rights.
    pub is_superuser: bool,

    /// Whether the email address has been verified.
    pub is_verified: bool,

    /// Linked OAuth accounts; `None` for a plain user.
    #[serde(default)]
    pub oauth_accounts: Option<Vec<OAuthAccount>>,

    /// Application-defined fields.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Create an active, unverified, non-superuser account with a fresh ID.
    #[must_use]
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
            oauth_accounts: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Link an OAuth account, making this an OAuth user.
    #[must_use]
    pub fn with_oauth_account(mut self, account: OAuthAccount) -> Self {
        self.oauth_accounts.get_or_insert_with(Vec::new).push(account);
        self
    }

    /// Make this an OAuth user, keeping any accounts already linked.
    #[must_use]
    pub fn into_oauth_user(mut self) -> Self {
        self.oauth_accounts.get_or_insert_with(Vec::new);
        self
    }

    /// Set an application-defined field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Read an application-defined field as `T`.
    ///
    /// Returns `None` if the field is absent or does not deserialize as `T`.
    #[must_use]
    pub fn extra_field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extra
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Returns `true` if the record carries an OAuth account list, even an
    /// empty one.
    #[must_use]
    pub const fn is_oauth_user(&self) -> bool {
        self.oauth_accounts.is_some()
    }

    /// Linked accounts, empty for a plain user.
    #[must_use]
    pub fn linked_accounts(&self) -> &[OAuthAccount] {
        self.oauth_accounts.as_deref().unwrap_or_default()
    }

    /// Find a linked account by provider and provider account ID.
    #[must_use]
    pub fn oauth_account(&self, oauth_name: &str, account_id: &str) -> Option<&OAuthAccount> {
        self.linked_accounts()
            .iter()
            .find(|a| a.oauth_name == oauth_name && a.account_id == account_id)
    }

    /// Check the record against the storage constraints.
    ///
    /// Catches what the database would reject as a not-null or length
    /// violation, plus duplicate OAuth links within the record itself.
    /// Emails with surrounding whitespace are rejected so that stored and
    /// looked-up addresses compare the same way in every backend.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError::InvalidUser`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        check_required("email", &self.email, user_columns::EMAIL_MAX_LEN)?;
        if self.email.trim() != self.email {
            return Err(UserDbError::InvalidUser(
                "email must not have surrounding whitespace".to_string(),
            ));
        }
        check_required(
            "hashed_password",
            &self.hashed_password,
            user_columns::HASHED_PASSWORD_MAX_LEN,
        )?;

        let accounts = self.linked_accounts();
        for (i, account) in accounts.iter().enumerate() {
            account.validate()?;
            let duplicate = accounts[..i]
                .iter()
                .any(|a| a.oauth_name == account.oauth_name && a.account_id == account.account_id);
            if duplicate {
                return Err(UserDbError::InvalidUser(format!(
                    "OAuth account {}/{} is linked twice",
                    account.oauth_name, account.account_id
                )));
            }
        }

        Ok(())
    }
}

fn check_required(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(UserDbError::InvalidUser(format!("{field} must not be empty")));
    }
    check_max_len(field, value, max_len)
}

fn check_max_len(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.chars().count() > max_len {
        return Err(UserDbError::InvalidUser(format!(
            "{field} exceeds {max_len} characters"
        )));
    }
    Ok(())
}
