//! Persistence gateway primitives shared by all entity handlers.
//!
//! # Responsibility
//! - Wrap every mutating handler call in one SQLite transaction.
//! - Run eager-loading reads that span several queries against one snapshot.
//! - Stop work before a store call once the caller has cancelled.
//!
//! # Invariants
//! - A unit of work either commits fully or rolls back on drop.
//! - Store errors surface unchanged; nothing is retried here.

use super::{DbError, DbResult};
use log::{debug, warn};
use rusqlite::{Connection, Transaction};
use std::fmt::Display;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Fails with [`DbError::Cancelled`] once `cancel` has fired.
pub fn check_cancelled(cancel: &CancellationToken, operation: &'static str) -> DbResult<()> {
    if cancel.is_cancelled() {
        debug!("event=unit_of_work module=db status=cancelled op={operation}");
        return Err(DbError::Cancelled(operation));
    }
    Ok(())
}

/// Runs `work` inside a single transaction and commits it.
///
/// The transaction is opened through `unchecked_transaction` so handlers can
/// keep borrowing the connection immutably. Returning `Err` from `work` drops
/// the transaction, which rolls it back.
pub fn unit_of_work<T, E>(
    conn: &Connection,
    cancel: &CancellationToken,
    operation: &'static str,
    work: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<DbError> + Display,
{
    check_cancelled(cancel, operation)?;

    let started_at = Instant::now();
    let tx = conn.unchecked_transaction().map_err(DbError::from)?;
    match work(&tx) {
        Ok(value) => {
            tx.commit().map_err(DbError::from)?;
            debug!(
                "event=unit_of_work module=db status=ok op={operation} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            warn!(
                "event=unit_of_work module=db status=error op={operation} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Runs `work` inside a read transaction so every query sees one snapshot.
///
/// Nothing is written; the transaction is ended by dropping it.
pub fn read_snapshot<T, E>(
    conn: &Connection,
    cancel: &CancellationToken,
    operation: &'static str,
    work: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<DbError>,
{
    check_cancelled(cancel, operation)?;
    let tx = conn.unchecked_transaction().map_err(DbError::from)?;
    work(&tx)
}
