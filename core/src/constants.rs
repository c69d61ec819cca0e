//! Column limits shared by the domain types and the table definitions.

/// Column widths for the `users` table.
pub mod user_columns {
    /// Maximum email length (RFC 5321 path limit).
    pub const EMAIL_MAX_LEN: usize = 320;

    /// Maximum length of a stored password hash.
    pub const HASHED_PASSWORD_MAX_LEN: usize = 1024;
}

/// Column widths for the `oauth_accounts` table.
pub mod oauth_columns {
    /// Maximum OAuth provider name length.
    pub const OAUTH_NAME_MAX_LEN: usize = 100;

    /// Maximum access/refresh token length.
    pub const TOKEN_MAX_LEN: usize = 1024;

    /// Maximum provider account id length.
    pub const ACCOUNT_ID_MAX_LEN: usize = 320;

    /// Maximum provider account email length.
    pub const ACCOUNT_EMAIL_MAX_LEN: usize = 320;
}
