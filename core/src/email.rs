//! Email helpers.
//!
//! Emails are stored as given and compared case-insensitively. Surrounding
//! whitespace is never stripped: `User::validate` rejects it on write, and a
//! padded lookup matches nothing. Backends that cannot push the comparison
//! into their query language compare the output of [`normalize_email`].

/// Normalize an email for comparison by lowercasing it. Whitespace is kept,
/// matching `lower(email)` on the SQL side.
///
/// # Examples
///
/// ```
/// use userdb_core::email::normalize_email;
///
/// assert_eq!(normalize_email("Lancelot@Camelot.bt"), "lancelot@camelot.bt");
/// assert_ne!(normalize_email("lancelot@camelot.bt "), "lancelot@camelot.bt");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// Returns `true` if two emails refer to the same mailbox for lookup purposes.
///
/// # Examples
///
/// ```
/// use userdb_core::email::emails_match;
///
/// assert!(emails_match("lancelot@camelot.bt", "Lancelot@camelot.bt"));
/// assert!(!emails_match("lancelot@camelot.bt", "galahad@camelot.bt"));
/// ```
#[must_use]
pub fn emails_match(a: &str, b: &str) -> bool {
    normalize_email(a) == normalize_email(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_lowercases_domain_and_local_part() {
        assert_eq!(normalize_email("KING.Arthur@CAMELOT.BT"), "king.arthur@camelot.bt");
    }

    #[test]
    fn test_padded_email_does_not_match() {
        assert!(!emails_match("lancelot@camelot.bt ", "lancelot@camelot.bt"));
    }

    #[test]
    fn test_normalize_keeps_inner_characters() {
        assert_eq!(normalize_email("user+tag@example.com"), "user+tag@example.com");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(email in "[A-Za-z0-9._+-]{1,20}@[A-Za-z0-9-]{1,10}\\.[a-z]{2,4}") {
            let once = normalize_email(&email);
            prop_assert_eq!(normalize_email(&once), once);
        }

        #[test]
        fn uppercased_email_still_matches(email in "[a-z0-9._+-]{1,20}@[a-z0-9-]{1,10}\\.[a-z]{2,4}") {
            prop_assert!(emails_match(&email, &email.to_uppercase()));
        }
    }
}
