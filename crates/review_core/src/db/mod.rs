//! SQLite storage bootstrap, schema migrations and the persistence gateway.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the review service.
//! - Apply schema migrations in deterministic order.
//! - Provide the unit-of-work and cancellation primitives used by handlers.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.

pub mod gateway;
pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_target};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
    #[error("operation `{0}` cancelled before reaching the store")]
    Cancelled(&'static str),
}
