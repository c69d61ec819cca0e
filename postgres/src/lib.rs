//! `PostgreSQL` user database for userdb.
//!
//! This crate implements the `UserDatabase` contract from `userdb-core` on
//! top of sqlx. It provides:
//!
//! - A users table and an optional OAuth accounts table
//! - Case-insensitive email lookup and uniqueness
//! - Lookup by linked OAuth account
//! - Transactional writes of a user together with its OAuth accounts
//!
//! Queries are checked at runtime, so building does not need a database.
//!
//! # Example
//!
//! ```ignore
//! use userdb_postgres::{DatabaseConfig, PostgresUserDatabase, TableConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new("postgres://localhost/app");
//!     let db = PostgresUserDatabase::connect(&config, TableConfig::default()).await?;
//!     db.create_tables().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
mod queries;
pub mod schema;

pub use config::{ConfigError, DatabaseConfig, TableConfig};
pub use database::PostgresUserDatabase;
pub use schema::{OAuthAccountTable, UserTable};
