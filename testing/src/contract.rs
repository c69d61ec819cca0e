//! Behaviour every [`UserDatabase`] backend must share.
//!
//! Each function drives one scenario against a fresh, empty backend and
//! panics on the first divergence. Backend test suites call them from their
//! own `#[tokio::test]` functions, so the mock and `PostgreSQL` stay in step.
//!
//! Functions named `*_without_oauth_table` expect a backend with no OAuth
//! account storage; `*_with_oauth_table` ones expect it configured.

#![allow(clippy::expect_used)] // Scenario failures read best as expect messages
#![allow(clippy::missing_panics_doc)]

use crate::fixtures;
use userdb_core::{User, UserDatabase, UserDbError};

/// Plain user round trip, duplicate detection and OAuth rejection.
pub async fn queries_without_oauth_table<D: UserDatabase>(db: &D) {
    let user = fixtures::lancelot();

    // Create
    let mut user_db = db.create(&user).await.expect("Failed to create user");
    assert_eq!(user_db.id, user.id);
    assert!(user_db.is_active);
    assert!(!user_db.is_superuser);
    assert_eq!(user_db.email, user.email);

    // Update
    user_db.is_superuser = true;
    db.update(&user_db).await.expect("Failed to update user");

    // Get by id
    let id_user = db
        .get(user.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(id_user.id, user_db.id);
    assert!(id_user.is_superuser);
    assert_eq!(id_user.oauth_accounts, None);

    // Get by email, in any casing
    for email in [user.email.as_str(), "Lancelot@camelot.bt", "LANCELOT@CAMELOT.BT"] {
        let email_user = db
            .get_by_email(email)
            .await
            .expect("Failed to get user")
            .expect("User should exist");
        assert_eq!(email_user.id, user_db.id, "lookup by {email:?}");
    }

    // Re-inserting the same record
    assert!(matches!(
        db.create(&user).await,
        Err(UserDbError::ConstraintViolation(_))
    ));

    // Existing email, in any casing
    let mut duplicate = fixtures::lancelot();
    duplicate.email = "LANCELOT@camelot.bt".to_string();
    assert!(matches!(
        db.create(&duplicate).await,
        Err(UserDbError::EmailAlreadyExists { .. })
    ));

    // Missing required field
    let wrong_user = User::new("", "aaa");
    assert!(matches!(
        db.create(&wrong_user).await,
        Err(UserDbError::InvalidUser(_))
    ));

    // Unknown user
    let unknown_user = db
        .get_by_email("galahad@camelot.bt")
        .await
        .expect("Failed to get user");
    assert!(unknown_user.is_none());

    // Delete user
    db.delete(&user).await.expect("Failed to delete user");
    let deleted_user = db.get(user.id).await.expect("Failed to get user");
    assert!(deleted_user.is_none());

    // OAuth users cannot be written, with or without linked accounts
    for user_oauth in [fixtures::lancelot_with_oauth(), fixtures::lancelot().into_oauth_user()] {
        assert_eq!(
            db.create(&user_oauth).await,
            Err(UserDbError::OAuthAccountTableNotSet)
        );
        assert_eq!(
            db.update(&user_oauth).await,
            Err(UserDbError::OAuthAccountTableNotSet)
        );
        let stored = db
            .get_by_email(&user_oauth.email)
            .await
            .expect("Failed to get user");
        assert!(stored.is_none(), "Rejected OAuth user must not be partially written");
    }

    // OAuth lookup
    assert_eq!(
        db.get_by_oauth_account("foo", "bar").await,
        Err(UserDbError::OAuthAccountTableNotSet)
    );
}

/// Custom fields survive a round trip.
pub async fn queries_custom_fields<D: UserDatabase>(db: &D) {
    let user = fixtures::lancelot_with_first_name();
    db.create(&user).await.expect("Failed to create user");

    let id_user = db
        .get(user.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(id_user.id, user.id);
    assert_eq!(
        id_user.extra_field::<String>("first_name").as_deref(),
        Some("Lancelot")
    );
}

/// Emails are compared case-insensitively and never trimmed.
pub async fn padded_email_is_a_different_email<D: UserDatabase>(db: &D) {
    let user = db
        .create(&fixtures::lancelot())
        .await
        .expect("Failed to create user");

    for padded in ["lancelot@camelot.bt ", " Lancelot@camelot.bt", "\tlancelot@camelot.bt"] {
        let found = db.get_by_email(padded).await.expect("Failed to get user");
        assert!(found.is_none(), "{padded:?} must not match a stored email");

        let mut padded_user = fixtures::lancelot();
        padded_user.email = padded.to_string();
        assert!(matches!(
            db.create(&padded_user).await,
            Err(UserDbError::InvalidUser(_))
        ));
    }

    let found = db
        .get_by_email("lancelot@camelot.bt")
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(found.id, user.id);
}

/// Changing an email to one already taken fails in any casing.
pub async fn update_to_taken_email<D: UserDatabase>(db: &D) {
    db.create(&fixtures::lancelot())
        .await
        .expect("Failed to create user");
    let mut galahad = db
        .create(&User::new("galahad@camelot.bt", "grail"))
        .await
        .expect("Failed to create user");

    galahad.email = "Lancelot@Camelot.bt".to_string();
    assert!(matches!(
        db.update(&galahad).await,
        Err(UserDbError::EmailAlreadyExists { .. })
    ));

    let stored = db
        .get(galahad.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(stored.email, "galahad@camelot.bt");
}

/// Updating a user that was never created.
pub async fn update_missing_user<D: UserDatabase>(db: &D) {
    assert_eq!(
        db.update(&fixtures::lancelot()).await,
        Err(UserDbError::UserNotFound)
    );
}

/// Deleting a user that was never created.
pub async fn delete_missing_user_is_noop<D: UserDatabase>(db: &D) {
    assert_eq!(db.delete(&fixtures::lancelot()).await, Ok(()));
}

/// Round trip of a user with two linked accounts.
pub async fn queries_with_oauth_table<D: UserDatabase>(db: &D) {
    let user = fixtures::lancelot_with_oauth();

    // Create
    let mut user_db = db.create(&user).await.expect("Failed to create user");
    assert_eq!(user_db.linked_accounts().len(), 2);

    // Update
    let accounts = user_db
        .oauth_accounts
        .as_mut()
        .expect("OAuth user should carry accounts");
    accounts[0].access_token = "NEW_TOKEN".to_string();
    db.update(&user_db).await.expect("Failed to update user");

    // Get by id
    let id_user = db
        .get(user.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(id_user.id, user_db.id);
    assert_eq!(id_user.linked_accounts()[0].access_token, "NEW_TOKEN");
    assert_eq!(id_user.linked_accounts()[0], user_db.linked_accounts()[0]);

    // Get by email
    let email_user = db
        .get_by_email(&user.email)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(email_user.id, user_db.id);
    assert_eq!(email_user.linked_accounts().len(), 2);

    // Get by OAuth account
    let account = fixtures::oauth_account1();
    let oauth_user = db
        .get_by_oauth_account(&account.oauth_name, &account.account_id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(oauth_user.id, user.id);
    assert_eq!(oauth_user.linked_accounts().len(), 2);

    // Unknown OAuth account
    let unknown_oauth_user = db
        .get_by_oauth_account("foo", "bar")
        .await
        .expect("Failed to get user");
    assert!(unknown_oauth_user.is_none());

    // A plain user reads back as an OAuth user with no accounts
    let galahad = db
        .create(&User::new("galahad@camelot.bt", "grail"))
        .await
        .expect("Failed to create user");
    let stored = db
        .get(galahad.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(stored.oauth_accounts, Some(Vec::new()));
}

/// An `(oauth_name, account_id)` pair belongs to at most one user.
pub async fn oauth_account_linked_to_one_user_only<D: UserDatabase>(db: &D) {
    db.create(&fixtures::lancelot_with_oauth())
        .await
        .expect("Failed to create user");

    let mut galahad =
        User::new("galahad@camelot.bt", "grail").with_oauth_account(fixtures::oauth_account1());
    assert!(matches!(
        db.create(&galahad).await,
        Err(UserDbError::ConstraintViolation(_))
    ));

    // The failed create left nothing behind
    let stored = db
        .get_by_email("galahad@camelot.bt")
        .await
        .expect("Failed to get user");
    assert!(stored.is_none());

    galahad.oauth_accounts = None;
    db.create(&galahad).await.expect("Failed to create user");
}

/// An OAuth user's update replaces its linked accounts, down to none.
pub async fn update_replaces_linked_accounts<D: UserDatabase>(db: &D) {
    let mut user = db
        .create(&fixtures::lancelot_with_oauth())
        .await
        .expect("Failed to create user");

    user.oauth_accounts = Some(vec![fixtures::oauth_account2()]);
    db.update(&user).await.expect("Failed to update user");

    let unlinked = db
        .get_by_oauth_account("service1", "user_oauth1")
        .await
        .expect("Failed to get user");
    assert!(unlinked.is_none());

    let stored = db
        .get(user.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(stored.linked_accounts().len(), 1);
    assert_eq!(stored.linked_accounts()[0].oauth_name, "service2");

    // An empty list is still an OAuth user: every account is unlinked
    user.oauth_accounts = Some(Vec::new());
    db.update(&user).await.expect("Failed to update user");

    let stored = db
        .get(user.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(stored.oauth_accounts, Some(Vec::new()));
}

/// A plain user's update leaves linked accounts alone.
pub async fn plain_update_keeps_linked_accounts<D: UserDatabase>(db: &D) {
    let user = db
        .create(&fixtures::lancelot_with_oauth())
        .await
        .expect("Failed to create user");

    let mut plain = user.clone();
    plain.oauth_accounts = None;
    plain.is_verified = true;
    db.update(&plain).await.expect("Failed to update user");

    let stored = db
        .get(user.id)
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert!(stored.is_verified);
    assert_eq!(stored.linked_accounts().len(), 2);

    let found = db
        .get_by_oauth_account("service1", "user_oauth1")
        .await
        .expect("Failed to get user")
        .expect("User should exist");
    assert_eq!(found.id, user.id);
}
