//! Contract tests for `MockUserDatabase`.
//!
//! Runs the shared [`userdb_testing::contract`] scenarios in memory; the
//! `PostgreSQL` integration tests run the same ones.

#![allow(clippy::unwrap_used)]

use userdb_core::UserDatabase;
use userdb_testing::{MockUserDatabase, contract, fixtures, init_test_tracing};

#[tokio::test]
async fn test_queries() {
    init_test_tracing();
    contract::queries_without_oauth_table(&MockUserDatabase::new()).await;
}

#[tokio::test]
async fn test_queries_custom_fields() {
    contract::queries_custom_fields(&MockUserDatabase::new()).await;
}

#[tokio::test]
async fn test_padded_email_is_a_different_email() {
    contract::padded_email_is_a_different_email(&MockUserDatabase::new()).await;
}

#[tokio::test]
async fn test_update_to_taken_email() {
    contract::update_to_taken_email(&MockUserDatabase::new()).await;
}

#[tokio::test]
async fn test_update_missing_user() {
    contract::update_missing_user(&MockUserDatabase::new()).await;
}

#[tokio::test]
async fn test_delete_missing_user_is_noop() {
    contract::delete_missing_user_is_noop(&MockUserDatabase::new()).await;
}

#[tokio::test]
async fn test_queries_oauth() {
    init_test_tracing();
    contract::queries_with_oauth_table(&MockUserDatabase::with_oauth_accounts()).await;
}

#[tokio::test]
async fn test_oauth_account_linked_to_one_user_only() {
    let db = MockUserDatabase::with_oauth_accounts();
    contract::oauth_account_linked_to_one_user_only(&db).await;
    assert_eq!(db.len(), 2);
}

#[tokio::test]
async fn test_update_replaces_linked_accounts() {
    contract::update_replaces_linked_accounts(&MockUserDatabase::with_oauth_accounts()).await;
}

#[tokio::test]
async fn test_plain_update_keeps_linked_accounts() {
    contract::plain_update_keeps_linked_accounts(&MockUserDatabase::with_oauth_accounts()).await;
}

#[tokio::test]
async fn test_delete_removes_linked_accounts() {
    let db = MockUserDatabase::with_oauth_accounts();
    let user = db.create(&fixtures::lancelot_with_oauth()).await.unwrap();

    db.delete(&user).await.unwrap();
    assert!(db.is_empty());
    assert_eq!(
        db.get_by_oauth_account("service1", "user_oauth1").await.unwrap(),
        None
    );
}
