//! Error types for user database operations.

use thiserror::Error;

/// Result type alias for user database operations.
pub type Result<T> = std::result::Result<T, UserDbError>;

/// Error taxonomy for the user database adapter.
///
/// Lookups that find nothing are not errors: they return `Ok(None)`.
/// The variants below cover misconfiguration, integrity failures reported
/// by the storage backend, and backend failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserDbError {
    // ═══════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════

    /// An OAuth operation was attempted on a database created without an
    /// OAuth account table.
    #[error("OAuth account table is not set on this user database")]
    OAuthAccountTableNotSet,

    /// Adapter configuration is invalid (bad table name, missing URL, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ═══════════════════════════════════════════════════════════
    // Integrity Errors
    // ═══════════════════════════════════════════════════════════

    /// Another user already owns this email (compared case-insensitively).
    #[error("A user with email {email} already exists")]
    EmailAlreadyExists {
        /// Email that collided
        email: String,
    },

    /// A uniqueness, foreign-key or not-null constraint rejected the write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The user record failed validation before reaching the database.
    #[error("Invalid user: {0}")]
    InvalidUser(String),

    /// The user targeted by an update does not exist.
    #[error("User not found")]
    UserNotFound,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl UserDbError {
    /// Returns `true` if the write was rejected because of the data itself.
    ///
    /// # Examples
    ///
    /// ```
    /// # use userdb_core::UserDbError;
    /// assert!(UserDbError::ConstraintViolation("dup".into()).is_integrity_error());
    /// assert!(!UserDbError::OAuthAccountTableNotSet.is_integrity_error());
    /// ```
    #[must_use]
    pub const fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists { .. } | Self::ConstraintViolation(_) | Self::InvalidUser(_)
        )
    }

    /// Returns `true` if the error stems from how the database was set up
    /// rather than from the request.
    ///
    /// # Examples
    ///
    /// ```
    /// # use userdb_core::UserDbError;
    /// assert!(UserDbError::OAuthAccountTableNotSet.is_configuration_error());
    /// assert!(!UserDbError::UserNotFound.is_configuration_error());
    /// ```
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::OAuthAccountTableNotSet | Self::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_conflict_message_names_email() {
        let err = UserDbError::EmailAlreadyExists {
            email: "lancelot@camelot.bt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "A user with email lancelot@camelot.bt already exists"
        );
        assert!(err.is_integrity_error());
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_database_error_is_neither_integrity_nor_config() {
        let err = UserDbError::DatabaseError("connection reset".to_string());
        assert!(!err.is_integrity_error());
        assert!(!err.is_configuration_error());
    }
}
