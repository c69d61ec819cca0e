//! Table definitions for the users and OAuth accounts tables.
//!
//! Table names are configurable, so DDL and queries are rendered from these
//! definitions instead of being fixed SQL. Names are validated as plain
//! identifiers before they are ever interpolated; all values go through
//! bind parameters.
//!
//! Names are interpolated unquoted, so PostgreSQL folds them to lowercase.
//! The definitions lowercase them up front so derived index and constraint
//! names match what the server reports in errors.

use crate::config::ConfigError;
use userdb_core::constants::{oauth_columns, user_columns};

/// Default users table name.
pub const DEFAULT_USERS_TABLE: &str = "users";

/// Default OAuth accounts table name.
pub const DEFAULT_OAUTH_ACCOUNTS_TABLE: &str = "oauth_accounts";

/// Longest accepted table name. Derived index and constraint names append
/// up to 12 bytes and must fit PostgreSQL's 63-byte identifier limit.
pub const MAX_TABLE_NAME_LEN: usize = 40;

/// Check that `name` is a plain SQL identifier safe to interpolate.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if the name is empty, too long,
/// starts with a digit or contains anything but ASCII letters, digits and
/// underscores.
///
/// # Examples
///
/// ```
/// use userdb_postgres::schema::validate_identifier;
///
/// assert!(validate_identifier("users").is_ok());
/// assert!(validate_identifier("users\"; --").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::ValidationError(format!(
            "invalid table name {name:?}: expected [A-Za-z_][A-Za-z0-9_]*"
        )));
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(ConfigError::ValidationError(format!(
            "table name {name:?} exceeds {MAX_TABLE_NAME_LEN} bytes"
        )));
    }
    Ok(())
}

/// The users table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTable {
    name: String,
}

impl UserTable {
    /// Describe a users table named `name` (folded to lowercase).
    ///
    /// # Errors
    ///
    /// Returns error if `name` is not a valid identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self {
            name: name.to_ascii_lowercase(),
        })
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the unique index enforcing case-insensitive email uniqueness.
    #[must_use]
    pub fn email_index(&self) -> String {
        format!("{}_email_key", self.name)
    }

    /// Statements creating the table and its indexes. Idempotent.
    #[must_use]
    pub fn create_statements(&self) -> Vec<String> {
        let table = &self.name;
        vec![
            format!(
                r"
                CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY,
                    email VARCHAR({email_len}) NOT NULL,
                    hashed_password VARCHAR({password_len}) NOT NULL,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
                    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                    extra JSONB NOT NULL DEFAULT '{{}}'::jsonb
                )
                ",
                email_len = user_columns::EMAIL_MAX_LEN,
                password_len = user_columns::HASHED_PASSWORD_MAX_LEN,
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {table} (lower(email))",
                index = self.email_index(),
            ),
        ]
    }

    /// Statement dropping the table and everything referencing it.
    #[must_use]
    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE", self.name)
    }
}

impl Default for UserTable {
    fn default() -> Self {
        Self {
            name: DEFAULT_USERS_TABLE.to_string(),
        }
    }
}

/// The OAuth accounts table, referencing a [`UserTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthAccountTable {
    name: String,
    users_table: String,
}

impl OAuthAccountTable {
    /// Describe an OAuth accounts table named `name` (folded to lowercase)
    /// linked to `users`.
    ///
    /// # Errors
    ///
    /// Returns error if `name` is not a valid identifier.
    pub fn new(name: impl Into<String>, users: &UserTable) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self {
            name: name.to_ascii_lowercase(),
            users_table: users.name.clone(),
        })
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the unique constraint on `(oauth_name, account_id)`.
    #[must_use]
    pub fn account_constraint(&self) -> String {
        format!("{}_account_key", self.name)
    }

    /// Statements creating the table and its indexes. Idempotent.
    #[must_use]
    pub fn create_statements(&self) -> Vec<String> {
        let table = &self.name;
        vec![
            format!(
                r"
                CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY,
                    oauth_name VARCHAR({name_len}) NOT NULL,
                    access_token VARCHAR({token_len}) NOT NULL,
                    expires_at BIGINT,
                    refresh_token VARCHAR({token_len}),
                    account_id VARCHAR({account_id_len}) NOT NULL,
                    account_email VARCHAR({account_email_len}) NOT NULL,
                    user_id UUID NOT NULL REFERENCES {users}(id) ON DELETE CASCADE,
                    CONSTRAINT {constraint} UNIQUE (oauth_name, account_id)
                )
                ",
                name_len = oauth_columns::OAUTH_NAME_MAX_LEN,
                token_len = oauth_columns::TOKEN_MAX_LEN,
                account_id_len = oauth_columns::ACCOUNT_ID_MAX_LEN,
                account_email_len = oauth_columns::ACCOUNT_EMAIL_MAX_LEN,
                users = self.users_table,
                constraint = self.account_constraint(),
            ),
            format!("CREATE INDEX IF NOT EXISTS {table}_user_id_idx ON {table} (user_id)"),
        ]
    }

    /// Statement dropping the table.
    #[must_use]
    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("_users_2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2users").is_err());
        assert!(validate_identifier("user-accounts").is_err());
        assert!(validate_identifier("public.users").is_err());
        assert!(validate_identifier(&"u".repeat(MAX_TABLE_NAME_LEN)).is_ok());
        assert!(validate_identifier(&"u".repeat(MAX_TABLE_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_user_table_ddl() {
        let table = UserTable::default();
        let statements = table.create_statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(statements[0].contains("email VARCHAR(320) NOT NULL"));
        assert!(statements[0].contains("extra JSONB NOT NULL DEFAULT '{}'::jsonb"));
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (lower(email))"
        );
        assert_eq!(table.drop_statement(), "DROP TABLE IF EXISTS users CASCADE");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_oauth_table_references_users_table() {
        let users = UserTable::new("members").unwrap();
        let oauth = OAuthAccountTable::new("member_oauth", &users).unwrap();
        let statements = oauth.create_statements();
        assert!(statements[0].contains("REFERENCES members(id) ON DELETE CASCADE"));
        assert!(statements[0].contains("CONSTRAINT member_oauth_account_key UNIQUE (oauth_name, account_id)"));
        assert!(statements[1].contains("member_oauth_user_id_idx"));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_mixed_case_names_fold_to_lowercase() {
        let users = UserTable::new("Members").unwrap();
        assert_eq!(users.name(), "members");
        assert_eq!(users.email_index(), "members_email_key");

        let oauth = OAuthAccountTable::new("Member_OAuth", &users).unwrap();
        assert_eq!(oauth.name(), "member_oauth");
        assert_eq!(oauth.account_constraint(), "member_oauth_account_key");
        assert!(oauth.create_statements()[0].contains("REFERENCES members(id)"));
    }

    #[test]
    fn test_invalid_table_rejected_at_construction() {
        assert!(UserTable::new("users;").is_err());
        assert!(OAuthAccountTable::new("oauth accounts", &UserTable::default()).is_err());
    }

    proptest! {
        #[test]
        fn accepted_identifiers_contain_no_sql_metacharacters(name in ".{0,50}") {
            if validate_identifier(&name).is_ok() {
                prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
                prop_assert!(name.len() <= MAX_TABLE_NAME_LEN);
            }
        }

        #[test]
        fn well_formed_identifiers_accepted(name in "[a-z_][a-z0-9_]{0,39}") {
            prop_assert!(validate_identifier(&name).is_ok());
        }
    }
}
