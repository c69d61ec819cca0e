//! Mock implementations for testing.
//!
//! In-memory stand-ins for the storage backends, honouring the same
//! contract so tests of code generic over `UserDatabase` run at memory speed.

pub mod user_database;

pub use user_database::MockUserDatabase;
