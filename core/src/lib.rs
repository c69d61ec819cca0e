//! # userdb core
//!
//! Storage-agnostic pieces of the user database adapter:
//!
//! - [`User`] and [`OAuthAccount`] records
//! - the [`UserDatabase`] contract every backend implements
//! - the [`UserDbError`] taxonomy
//!
//! ## Example
//!
//! ```rust,ignore
//! use userdb_core::{OAuthAccount, User, UserDatabase};
//!
//! async fn register<D: UserDatabase>(db: &D) -> userdb_core::Result<()> {
//!     let user = User::new("lancelot@camelot.bt", "hashed")
//!         .with_oauth_account(OAuthAccount::new("google", "TOKEN", "1234", "lancelot@camelot.bt"));
//!     db.create(&user).await?;
//!
//!     let found = db.get_by_email("Lancelot@Camelot.bt").await?;
//!     assert_eq!(found.map(|u| u.id), Some(user.id));
//!     Ok(())
//! }
//! ```

pub mod constants;
pub mod database;
pub mod email;
pub mod error;
pub mod models;

// Re-export main types for convenience
pub use database::UserDatabase;
pub use error::{Result, UserDbError};
pub use models::{OAuthAccount, OAuthAccountId, User, UserId};
