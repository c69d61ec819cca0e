//! SQL text rendered once per table configuration.

use crate::schema::{OAuthAccountTable, UserTable};

const USER_COLUMNS: [&str; 7] = [
    "id",
    "email",
    "hashed_password",
    "is_active",
    "is_superuser",
    "is_verified",
    "extra",
];

const OAUTH_ACCOUNT_COLUMNS: &str =
    "id, oauth_name, access_token, expires_at, refresh_token, account_id, account_email";

fn user_columns(alias: Option<&str>) -> String {
    USER_COLUMNS
        .iter()
        .map(|column| match alias {
            Some(alias) => format!("{alias}.{column}"),
            None => (*column).to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Statements against the users table.
#[derive(Debug, Clone)]
pub(crate) struct UserQueries {
    pub select_by_id: String,
    pub select_by_email: String,
    pub insert: String,
    pub update: String,
    pub delete: String,
}

impl UserQueries {
    pub(crate) fn new(users: &UserTable) -> Self {
        let table = users.name();
        let columns = user_columns(None);
        Self {
            select_by_id: format!("SELECT {columns} FROM {table} WHERE id = $1"),
            select_by_email: format!(
                "SELECT {columns} FROM {table} WHERE lower(email) = lower($1)"
            ),
            insert: format!(
                "INSERT INTO {table} ({columns}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ),
            update: format!(
                r"
                UPDATE {table}
                SET email = $2,
                    hashed_password = $3,
                    is_active = $4,
                    is_superuser = $5,
                    is_verified = $6,
                    extra = $7
                WHERE id = $1
                "
            ),
            delete: format!("DELETE FROM {table} WHERE id = $1"),
        }
    }
}

/// Statements against the OAuth accounts table.
#[derive(Debug, Clone)]
pub(crate) struct OAuthQueries {
    pub select_by_user: String,
    pub select_user_by_account: String,
    pub insert: String,
    pub delete_by_user: String,
}

impl OAuthQueries {
    pub(crate) fn new(users: &UserTable, oauth: &OAuthAccountTable) -> Self {
        let users_table = users.name();
        let table = oauth.name();
        Self {
            select_by_user: format!(
                r"
                SELECT {OAUTH_ACCOUNT_COLUMNS}
                FROM {table}
                WHERE user_id = $1
                ORDER BY oauth_name, account_id
                "
            ),
            select_user_by_account: format!(
                r"
                SELECT {user_columns}
                FROM {users_table} u
                JOIN {table} o ON o.user_id = u.id
                WHERE o.oauth_name = $1 AND o.account_id = $2
                ",
                user_columns = user_columns(Some("u")),
            ),
            insert: format!(
                r"
                INSERT INTO {table} ({OAUTH_ACCOUNT_COLUMNS}, user_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "
            ),
            delete_by_user: format!("DELETE FROM {table} WHERE user_id = $1"),
        }
    }
}
