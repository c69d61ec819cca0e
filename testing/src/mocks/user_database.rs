//! Mock user database for testing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use userdb_core::email::emails_match;
use userdb_core::{OAuthAccount, Result, User, UserDatabase, UserDbError, UserId};

/// Mock user database.
///
/// Uses in-memory storage. Mirrors the `PostgreSQL` backend: emails are
/// unique and matched case-insensitively, `(oauth_name, account_id)` pairs
/// are unique across users, and OAuth operations fail with
/// [`UserDbError::OAuthAccountTableNotSet`] unless OAuth storage is enabled.
#[derive(Debug, Clone)]
pub struct MockUserDatabase {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    oauth_enabled: bool,
}

impl MockUserDatabase {
    /// Create a mock without OAuth account storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            oauth_enabled: false,
        }
    }

    /// Create a mock that stores OAuth accounts.
    #[must_use]
    pub fn with_oauth_accounts() -> Self {
        Self {
            oauth_enabled: true,
            ..Self::new()
        }
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.lock().map_or(0, |users| users.len())
    }

    /// Returns `true` if no users are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockUserDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(users: &Mutex<HashMap<UserId, User>>) -> Result<MutexGuard<'_, HashMap<UserId, User>>> {
    users
        .lock()
        .map_err(|_| UserDbError::DatabaseError("mock user store lock poisoned".to_string()))
}

/// Copy of a stored user as a backend would return it: with its linked
/// accounts, sorted, when accounts are stored, and without them otherwise.
fn read(user: &User, oauth_enabled: bool) -> User {
    let mut user = user.clone();
    user.oauth_accounts = if oauth_enabled {
        let mut accounts = user.oauth_accounts.take().unwrap_or_default();
        accounts
            .sort_by(|a, b| (&a.oauth_name, &a.account_id).cmp(&(&b.oauth_name, &b.account_id)));
        Some(accounts)
    } else {
        None
    };
    user
}

fn check_oauth_storage(oauth_enabled: bool, user: &User) -> Result<()> {
    if !oauth_enabled && user.is_oauth_user() {
        return Err(UserDbError::OAuthAccountTableNotSet);
    }
    Ok(())
}

/// Reject `user` if another stored user owns its email or one of its accounts.
fn check_conflicts(users: &HashMap<UserId, User>, user: &User) -> Result<()> {
    for other in users.values().filter(|other| other.id != user.id) {
        if emails_match(&other.email, &user.email) {
            return Err(UserDbError::EmailAlreadyExists {
                email: user.email.clone(),
            });
        }
        let taken = user
            .linked_accounts()
            .iter()
            .find(|a: &&OAuthAccount| other.oauth_account(&a.oauth_name, &a.account_id).is_some());
        if let Some(account) = taken {
            return Err(UserDbError::ConstraintViolation(format!(
                "OAuth account {}/{} is linked to another user",
                account.oauth_name, account.account_id
            )));
        }
    }
    Ok(())
}

impl UserDatabase for MockUserDatabase {
    fn get(&self, id: UserId) -> impl Future<Output = Result<Option<User>>> + Send {
        let users = Arc::clone(&self.users);
        let oauth_enabled = self.oauth_enabled;

        async move { Ok(lock(&users)?.get(&id).map(|user| read(user, oauth_enabled))) }
    }

    fn get_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send {
        let users = Arc::clone(&self.users);
        let oauth_enabled = self.oauth_enabled;
        let email = email.to_string();

        async move {
            Ok(lock(&users)?
                .values()
                .find(|user| emails_match(&user.email, &email))
                .map(|user| read(user, oauth_enabled)))
        }
    }

    fn get_by_oauth_account(
        &self,
        oauth_name: &str,
        account_id: &str,
    ) -> impl Future<Output = Result<Option<User>>> + Send {
        let users = Arc::clone(&self.users);
        let oauth_enabled = self.oauth_enabled;
        let oauth_name = oauth_name.to_string();
        let account_id = account_id.to_string();

        async move {
            if !oauth_enabled {
                return Err(UserDbError::OAuthAccountTableNotSet);
            }
            Ok(lock(&users)?
                .values()
                .find(|user| user.oauth_account(&oauth_name, &account_id).is_some())
                .map(|user| read(user, oauth_enabled)))
        }
    }

    fn create(&self, user: &User) -> impl Future<Output = Result<User>> + Send {
        let users = Arc::clone(&self.users);
        let oauth_enabled = self.oauth_enabled;
        let user = user.clone();

        async move {
            user.validate()?;
            check_oauth_storage(oauth_enabled, &user)?;

            let mut guard = lock(&users)?;
            if guard.contains_key(&user.id) {
                return Err(UserDbError::ConstraintViolation(format!(
                    "User {} already exists",
                    user.id
                )));
            }
            check_conflicts(&guard, &user)?;
            guard.insert(user.id, user.clone());

            tracing::debug!(user_id = %user.id, "Mock user created");
            Ok(user)
        }
    }

    fn update(&self, user: &User) -> impl Future<Output = Result<User>> + Send {
        let users = Arc::clone(&self.users);
        let oauth_enabled = self.oauth_enabled;
        let user = user.clone();

        async move {
            user.validate()?;
            check_oauth_storage(oauth_enabled, &user)?;

            let mut guard = lock(&users)?;
            if !guard.contains_key(&user.id) {
                return Err(UserDbError::UserNotFound);
            }
            check_conflicts(&guard, &user)?;
            let mut stored = user.clone();
            if !stored.is_oauth_user() {
                stored.oauth_accounts = guard
                    .get(&user.id)
                    .and_then(|existing| existing.oauth_accounts.clone());
            }
            guard.insert(user.id, stored);

            tracing::debug!(user_id = %user.id, "Mock user updated");
            Ok(user)
        }
    }

    fn delete(&self, user: &User) -> impl Future<Output = Result<()>> + Send {
        let users = Arc::clone(&self.users);
        let id = user.id;

        async move {
            lock(&users)?.remove(&id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_return_accounts_in_provider_order() {
        let db = MockUserDatabase::with_oauth_accounts();
        let user = User::new("lancelot@camelot.bt", "guinevere")
            .with_oauth_account(OAuthAccount::new("zeta", "T", "1", "a@b.c"))
            .with_oauth_account(OAuthAccount::new("alpha", "T", "2", "a@b.c"));
        assert!(db.create(&user).await.is_ok());

        let stored = db.get(user.id).await;
        let names: Vec<String> = stored
            .ok()
            .flatten()
            .map(|u| u.linked_accounts().iter().map(|a| a.oauth_name.clone()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[tokio::test]
    async fn test_len_tracks_creates_and_deletes() {
        let db = MockUserDatabase::new();
        assert!(db.is_empty());

        let user = User::new("lancelot@camelot.bt", "guinevere");
        assert!(db.create(&user).await.is_ok());
        assert_eq!(db.len(), 1);

        assert!(db.delete(&user).await.is_ok());
        assert!(db.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = MockUserDatabase::new();
        let user = User::new("lancelot@camelot.bt", "guinevere");
        assert!(db.create(&user).await.is_ok());

        let mut clone = user.clone();
        clone.email = "galahad@camelot.bt".to_string();
        assert!(matches!(
            db.create(&clone).await,
            Err(UserDbError::ConstraintViolation(_))
        ));
    }
}
