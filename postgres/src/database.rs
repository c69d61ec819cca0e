//! PostgreSQL user database implementation.
//!
//! # Example
//!
//! ```no_run
//! use userdb_core::{User, UserDatabase};
//! use userdb_postgres::{DatabaseConfig, PostgresUserDatabase, TableConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::from_env()?;
//! let db = PostgresUserDatabase::connect(&config, TableConfig::default().with_oauth_accounts()).await?;
//! db.create_tables().await?;
//!
//! let user = db.create(&User::new("lancelot@camelot.bt", "hashed")).await?;
//! assert!(db.get_by_email("Lancelot@camelot.bt").await?.is_some());
//! db.delete(&user).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{DatabaseConfig, TableConfig};
use crate::queries::{OAuthQueries, UserQueries};
use crate::schema::{OAuthAccountTable, UserTable};
use serde_json::{Map, Value};
use sqlx::error::ErrorKind;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use userdb_core::{OAuthAccount, OAuthAccountId, Result, User, UserDatabase, UserDbError, UserId};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    hashed_password: String,
    is_active: bool,
    is_superuser: bool,
    is_verified: bool,
    extra: Json<Map<String, Value>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            email: row.email,
            hashed_password: row.hashed_password,
            is_active: row.is_active,
            is_superuser: row.is_superuser,
            is_verified: row.is_verified,
            oauth_accounts: None,
            extra: row.extra.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OAuthAccountRow {
    id: Uuid,
    oauth_name: String,
    access_token: String,
    expires_at: Option<i64>,
    refresh_token: Option<String>,
    account_id: String,
    account_email: String,
}

impl From<OAuthAccountRow> for OAuthAccount {
    fn from(row: OAuthAccountRow) -> Self {
        Self {
            id: OAuthAccountId(row.id),
            oauth_name: row.oauth_name,
            access_token: row.access_token,
            expires_at: row.expires_at,
            refresh_token: row.refresh_token,
            account_id: row.account_id,
            account_email: row.account_email,
        }
    }
}

#[derive(Debug)]
struct Tables {
    users: UserTable,
    oauth_accounts: Option<OAuthAccountTable>,
    user_queries: UserQueries,
    oauth_queries: Option<OAuthQueries>,
}

/// `PostgreSQL` user database.
///
/// Stores users in one table and, when configured, their linked OAuth
/// accounts in a second table that cascades on user deletion. Cloning is
/// cheap: clones share the pool and the rendered statements.
#[derive(Clone)]
pub struct PostgresUserDatabase {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
    tables: Arc<Tables>,
}

impl PostgresUserDatabase {
    /// Create a user database over an existing pool.
    ///
    /// # Errors
    ///
    /// Returns [`UserDbError::InvalidConfig`] if a table name is invalid.
    pub fn from_pool(pool: PgPool, config: TableConfig) -> Result<Self> {
        config.validate()?;

        let users = UserTable::new(config.users_table)?;
        let oauth_accounts = config
            .oauth_accounts_table
            .map(|name| OAuthAccountTable::new(name, &users))
            .transpose()?;
        let user_queries = UserQueries::new(&users);
        let oauth_queries = oauth_accounts
            .as_ref()
            .map(|oauth| OAuthQueries::new(&users, oauth));

        tracing::debug!(
            users_table = users.name(),
            oauth_accounts_table = oauth_accounts.as_ref().map(OAuthAccountTable::name),
            "User database configured"
        );

        Ok(Self {
            pool,
            tables: Arc::new(Tables {
                users,
                oauth_accounts,
                user_queries,
                oauth_queries,
            }),
        })
    }

    /// Open a connection pool and create a user database over it.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the database is
    /// unreachable.
    pub async fn connect(config: &DatabaseConfig, tables: TableConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect(&config.url)
            .await
            .map_err(|e| UserDbError::DatabaseError(format!("Failed to connect: {e}")))?;

        tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");

        Self::from_pool(pool, tables)
    }

    /// Connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns `true` if OAuth accounts are stored.
    #[must_use]
    pub fn has_oauth_accounts(&self) -> bool {
        self.tables.oauth_accounts.is_some()
    }

    /// Create the configured tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns error if a DDL statement fails.
    pub async fn create_tables(&self) -> Result<()> {
        let mut statements = self.tables.users.create_statements();
        if let Some(oauth) = &self.tables.oauth_accounts {
            statements.extend(oauth.create_statements());
        }

        let mut tx = self.begin().await?;
        for statement in &statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| UserDbError::DatabaseError(format!("Failed to create tables: {e}")))?;
        }
        commit(tx).await?;

        tracing::info!(users_table = self.tables.users.name(), "User tables created");
        Ok(())
    }

    /// Drop the configured tables and their data.
    ///
    /// # Errors
    ///
    /// Returns error if a DDL statement fails.
    pub async fn drop_tables(&self) -> Result<()> {
        let mut statements = Vec::with_capacity(2);
        if let Some(oauth) = &self.tables.oauth_accounts {
            statements.push(oauth.drop_statement());
        }
        statements.push(self.tables.users.drop_statement());

        let mut tx = self.begin().await?;
        for statement in &statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| UserDbError::DatabaseError(format!("Failed to drop tables: {e}")))?;
        }
        commit(tx).await?;

        tracing::info!(users_table = self.tables.users.name(), "User tables dropped");
        Ok(())
    }

    async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| UserDbError::DatabaseError(format!("Failed to start transaction: {e}")))
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| UserDbError::DatabaseError(format!("Failed to acquire connection: {e}")))
    }

    /// OAuth statements to run for a write of `user`.
    ///
    /// `None` means `user` is a plain user: linked accounts stay as they are.
    fn oauth_queries_for(&self, user: &User) -> Result<Option<&OAuthQueries>> {
        if !user.is_oauth_user() {
            return Ok(None);
        }
        match &self.tables.oauth_queries {
            Some(queries) => Ok(Some(queries)),
            None => {
                tracing::warn!(
                    user_id = %user.id,
                    accounts = user.linked_accounts().len(),
                    "Rejected write of OAuth user: no OAuth account table"
                );
                Err(UserDbError::OAuthAccountTableNotSet)
            }
        }
    }

    /// Map a failed write to the error taxonomy.
    fn write_error(&self, err: sqlx::Error, email: &str, action: &str) -> UserDbError {
        if let sqlx::Error::Database(db_err) = &err {
            let email_index = self.tables.users.email_index();
            if db_err.is_unique_violation() && db_err.constraint() == Some(email_index.as_str()) {
                return UserDbError::EmailAlreadyExists {
                    email: email.to_string(),
                };
            }
            if matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) {
                return UserDbError::ConstraintViolation(format!(
                    "Failed to {action}: {}",
                    db_err.message()
                ));
            }
        }
        UserDbError::DatabaseError(format!("Failed to {action}: {err}"))
    }

    async fn fetch_user(
        &self,
        conn: &mut PgConnection,
        row: Option<UserRow>,
    ) -> Result<Option<User>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut user = User::from(row);

        if let Some(queries) = &self.tables.oauth_queries {
            let rows: Vec<OAuthAccountRow> = sqlx::query_as(&queries.select_by_user)
                .bind(user.id.0)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    UserDbError::DatabaseError(format!("Failed to get OAuth accounts: {e}"))
                })?;
            user.oauth_accounts = Some(rows.into_iter().map(OAuthAccount::from).collect());
        }

        Ok(Some(user))
    }

    async fn insert_oauth_accounts(
        &self,
        conn: &mut PgConnection,
        queries: &OAuthQueries,
        user: &User,
    ) -> Result<()> {
        let accounts = user.linked_accounts();
        for account in accounts {
            sqlx::query(&queries.insert)
                .bind(account.id.0)
                .bind(&account.oauth_name)
                .bind(&account.access_token)
                .bind(account.expires_at)
                .bind(account.refresh_token.as_deref())
                .bind(&account.account_id)
                .bind(&account.account_email)
                .bind(user.id.0)
                .execute(&mut *conn)
                .await
                .map_err(|e| self.write_error(e, &user.email, "link OAuth account"))?;
        }

        metrics::counter!("userdb.oauth_accounts.written")
            .increment(accounts.len() as u64);
        Ok(())
    }
}

async fn commit(tx: sqlx::Transaction<'static, sqlx::Postgres>) -> Result<()> {
    tx.commit()
        .await
        .map_err(|e| UserDbError::DatabaseError(format!("Failed to commit transaction: {e}")))
}

impl UserDatabase for PostgresUserDatabase {
    #[tracing::instrument(skip_all, fields(user_id = %id))]
    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let mut conn = self.acquire().await?;
        let row: Option<UserRow> = sqlx::query_as(&self.tables.user_queries.select_by_id)
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| UserDbError::DatabaseError(format!("Failed to get user: {e}")))?;

        let user = self.fetch_user(&mut conn, row).await?;
        tracing::debug!(found = user.is_some(), "User lookup by id");
        Ok(user)
    }

    #[tracing::instrument(skip_all)]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.acquire().await?;
        let row: Option<UserRow> = sqlx::query_as(&self.tables.user_queries.select_by_email)
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| UserDbError::DatabaseError(format!("Failed to get user: {e}")))?;

        let user = self.fetch_user(&mut conn, row).await?;
        tracing::debug!(found = user.is_some(), "User lookup by email");
        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_oauth_account(
        &self,
        oauth_name: &str,
        account_id: &str,
    ) -> Result<Option<User>> {
        let Some(queries) = &self.tables.oauth_queries else {
            return Err(UserDbError::OAuthAccountTableNotSet);
        };

        let mut conn = self.acquire().await?;
        let row: Option<UserRow> = sqlx::query_as(&queries.select_user_by_account)
            .bind(oauth_name)
            .bind(account_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| UserDbError::DatabaseError(format!("Failed to get user: {e}")))?;

        let user = self.fetch_user(&mut conn, row).await?;
        tracing::debug!(found = user.is_some(), "User lookup by OAuth account");
        Ok(user)
    }

    #[tracing::instrument(skip_all, fields(user_id = %user.id))]
    async fn create(&self, user: &User) -> Result<User> {
        user.validate()?;
        let oauth_queries = self.oauth_queries_for(user)?;

        let mut tx = self.begin().await?;

        sqlx::query(&self.tables.user_queries.insert)
            .bind(user.id.0)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(user.is_active)
            .bind(user.is_superuser)
            .bind(user.is_verified)
            .bind(Json(&user.extra))
            .execute(&mut *tx)
            .await
            .map_err(|e| self.write_error(e, &user.email, "create user"))?;

        if let Some(queries) = oauth_queries {
            self.insert_oauth_accounts(&mut *tx, queries, user).await?;
        }

        commit(tx).await?;

        metrics::counter!("userdb.users.created").increment(1);
        tracing::info!(oauth_accounts = user.linked_accounts().len(), "User created");

        Ok(user.clone())
    }

    #[tracing::instrument(skip_all, fields(user_id = %user.id))]
    async fn update(&self, user: &User) -> Result<User> {
        user.validate()?;
        let oauth_queries = self.oauth_queries_for(user)?;

        let mut tx = self.begin().await?;

        let result = sqlx::query(&self.tables.user_queries.update)
            .bind(user.id.0)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(user.is_active)
            .bind(user.is_superuser)
            .bind(user.is_verified)
            .bind(Json(&user.extra))
            .execute(&mut *tx)
            .await
            .map_err(|e| self.write_error(e, &user.email, "update user"))?;

        if result.rows_affected() == 0 {
            let _ = tx.rollback().await; // Ignore rollback errors
            return Err(UserDbError::UserNotFound);
        }

        // An OAuth user's record replaces its linked accounts wholesale.
        if let Some(queries) = oauth_queries {
            sqlx::query(&queries.delete_by_user)
                .bind(user.id.0)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    UserDbError::DatabaseError(format!("Failed to unlink OAuth accounts: {e}"))
                })?;
            self.insert_oauth_accounts(&mut *tx, queries, user).await?;
        }

        commit(tx).await?;

        metrics::counter!("userdb.users.updated").increment(1);
        tracing::info!(oauth_accounts = user.linked_accounts().len(), "User updated");

        Ok(user.clone())
    }

    #[tracing::instrument(skip_all, fields(user_id = %user.id))]
    async fn delete(&self, user: &User) -> Result<()> {
        let result = sqlx::query(&self.tables.user_queries.delete)
            .bind(user.id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| UserDbError::DatabaseError(format!("Failed to delete user: {e}")))?;

        if result.rows_affected() > 0 {
            metrics::counter!("userdb.users.deleted").increment(1);
            tracing::info!("User deleted");
        } else {
            tracing::debug!("Delete of missing user ignored");
        }

        Ok(())
    }
}
