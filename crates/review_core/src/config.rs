//! Store configuration parsed from caller-supplied connection strings.
//!
//! Accepted shapes:
//! - `:memory:` for a throwaway in-memory database.
//! - a bare file path such as `reviews.db`.
//! - `Key=Value;` pairs where `Data Source`, `DataSource` or `Filename`
//!   names the database file. Unknown keys are ignored.

use crate::db::{DbError, DbResult};
use std::path::PathBuf;

const MEMORY_SOURCE: &str = ":memory:";
const SOURCE_KEYS: [&str; 3] = ["data source", "datasource", "filename"];

/// Where the SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    InMemory,
    File(PathBuf),
}

impl StoreTarget {
    /// Parses a connection string into a store target.
    ///
    /// # Errors
    /// - Empty input.
    /// - Key/value input without a recognized data source key.
    pub fn parse(connection_string: &str) -> DbResult<Self> {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            return Err(DbError::InvalidConnectionString(
                "connection string cannot be empty".to_string(),
            ));
        }

        if !trimmed.contains('=') {
            return Ok(Self::from_source(trimmed));
        }

        for pair in trimmed.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            if SOURCE_KEYS.contains(&key.as_str()) {
                let value = value.trim();
                if value.is_empty() {
                    return Err(DbError::InvalidConnectionString(format!(
                        "`{}` has no value",
                        key
                    )));
                }
                return Ok(Self::from_source(value));
            }
        }

        Err(DbError::InvalidConnectionString(format!(
            "no data source in `{trimmed}`; expected one of Data Source|DataSource|Filename"
        )))
    }

    fn from_source(source: &str) -> Self {
        if source.eq_ignore_ascii_case(MEMORY_SOURCE) {
            Self::InMemory
        } else {
            Self::File(PathBuf::from(source))
        }
    }
}
