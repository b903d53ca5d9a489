//! taskhub storage: SurrealDB connection management and repository
//! implementations.
//!
//! [`DbManager::open`] connects (with retry) and brings the schema up
//! to date; every `taskhub-core` repository trait has a
//! `Surreal*Repository` implementation in [`repository`]. Storage
//! errors surface as [`DbError`] and convert into `TaskhubError`.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{hash_password, verify_password};
pub use schema::{run_migrations, schema_v1};
