//! Shared test data.
//!
//! The same records back the mock contract tests and the `PostgreSQL`
//! integration tests, so both backends are held to identical expectations.

use userdb_core::{OAuthAccount, User};

/// Access token expiry used by the OAuth fixtures (2020-01-14T11:19:11Z).
pub const OAUTH_EXPIRES_AT: i64 = 1_579_000_751;

/// A plain user without OAuth accounts.
#[must_use]
pub fn lancelot() -> User {
    User::new("lancelot@camelot.bt", "guinevere")
}

/// A user with a custom `first_name` field.
#[must_use]
pub fn lancelot_with_first_name() -> User {
    lancelot().with_extra("first_name", "Lancelot")
}

/// A user linked to [`oauth_account1`] and [`oauth_account2`].
#[must_use]
pub fn lancelot_with_oauth() -> User {
    lancelot()
        .with_oauth_account(oauth_account1())
        .with_oauth_account(oauth_account2())
}

/// Account `user_oauth1` at provider `service1`.
#[must_use]
pub fn oauth_account1() -> OAuthAccount {
    OAuthAccount::new("service1", "TOKEN", "user_oauth1", "king.arthur@camelot.bt")
        .with_expires_at(OAUTH_EXPIRES_AT)
        .with_refresh_token("REFRESH_TOKEN")
}

/// Account `user_oauth2` at provider `service2`.
#[must_use]
pub fn oauth_account2() -> OAuthAccount {
    OAuthAccount::new("service2", "TOKEN", "user_oauth2", "king.arthur@camelot.bt")
        .with_expires_at(OAUTH_EXPIRES_AT)
}
