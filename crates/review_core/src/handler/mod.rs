//! Entity handlers: one CRUD contract plus SQLite implementation per table.
//!
//! # Responsibility
//! - Keep SQL and row mapping inside the persistence boundary.
//! - Eager-load related rows so callers get complete records.
//!
//! # Invariants
//! - Every mutation runs through [`crate::db::gateway::unit_of_work`].
//! - `get_*` returns `Ok(None)` for a missing id; `update_*`/`delete_*`
//!   return [`RepoError::NotFound`].
//! - Every call checks the cancellation token before touching the store.

pub mod comment_handler;
pub mod customer_handler;
pub mod review_handler;

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::review::ReviewRating;
use crate::model::{EntityKind, ValidationError};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for handler persistence and query operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Db(DbError),
    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("operation `{0}` cancelled")]
    Cancelled(&'static str),
    #[error("handler requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("handler requires table `{0}`")]
    MissingRequiredTable(&'static str),
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Cancelled(operation) => Self::Cancelled(operation),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections that were not opened through [`crate::db::open_db`].
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required_tables: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in required_tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }

    Ok(())
}

pub(crate) fn parse_rating(value: i64, column: &str) -> RepoResult<ReviewRating> {
    ReviewRating::from_ordinal(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid rating `{value}` in {column}")))
}

pub(crate) fn datetime_to_db(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn parse_datetime(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}
