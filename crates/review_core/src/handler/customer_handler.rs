//! Customer handler contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths validate the record before SQL mutations.
//! - Lists are ordered by `CustomerId ASC`.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::db::gateway::{check_cancelled, unit_of_work};
use crate::model::customer::{Customer, CustomerId, NewCustomer};
use crate::model::EntityKind;
use rusqlite::{params, params_from_iter, Connection, Row};
use tokio_util::sync::CancellationToken;

const CUSTOMER_SELECT_SQL: &str = "SELECT CustomerId, Name FROM Customers";

/// CRUD contract over the `Customers` table.
pub trait CustomerHandler {
    fn add_customer(
        &self,
        customer: &NewCustomer,
        cancel: &CancellationToken,
    ) -> RepoResult<Customer>;
    fn get_customer(
        &self,
        id: CustomerId,
        cancel: &CancellationToken,
    ) -> RepoResult<Option<Customer>>;
    fn list_customers(&self, cancel: &CancellationToken) -> RepoResult<Vec<Customer>>;
    /// Returns the customers among `ids` that exist; unknown ids are skipped.
    fn list_customers_by_ids(
        &self,
        ids: &[CustomerId],
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<Customer>>;
    /// Overwrites the name and returns the stored state.
    fn update_customer(
        &self,
        customer: &Customer,
        cancel: &CancellationToken,
    ) -> RepoResult<Customer>;
    /// Removes the customer; their reviews and comments cascade.
    fn delete_customer(&self, id: CustomerId, cancel: &CancellationToken) -> RepoResult<()>;
}

/// SQLite-backed customer handler.
#[derive(Debug, Clone, Copy)]
pub struct SqliteCustomerHandler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerHandler<'conn> {
    /// Creates a handler from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["Customers"])?;
        Ok(Self { conn })
    }
}

impl CustomerHandler for SqliteCustomerHandler<'_> {
    fn add_customer(
        &self,
        customer: &NewCustomer,
        cancel: &CancellationToken,
    ) -> RepoResult<Customer> {
        customer.validate()?;

        unit_of_work(self.conn, cancel, "customer_add", |tx| {
            tx.execute(
                "INSERT INTO Customers (Name) VALUES (?1);",
                [customer.name.as_str()],
            )?;
            let id = tx.last_insert_rowid();
            load_customer(tx, id)?.ok_or(RepoError::NotFound {
                kind: EntityKind::Customer,
                id,
            })
        })
    }

    fn get_customer(
        &self,
        id: CustomerId,
        cancel: &CancellationToken,
    ) -> RepoResult<Option<Customer>> {
        check_cancelled(cancel, "customer_get")?;
        load_customer(self.conn, id)
    }

    fn list_customers(&self, cancel: &CancellationToken) -> RepoResult<Vec<Customer>> {
        check_cancelled(cancel, "customer_list")?;
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} ORDER BY CustomerId ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }
        Ok(customers)
    }

    fn list_customers_by_ids(
        &self,
        ids: &[CustomerId],
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<Customer>> {
        check_cancelled(cancel, "customer_list_by_ids")?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "{CUSTOMER_SELECT_SQL} WHERE CustomerId IN ({placeholders}) ORDER BY CustomerId ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(ids.iter()))?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }
        Ok(customers)
    }

    fn update_customer(
        &self,
        customer: &Customer,
        cancel: &CancellationToken,
    ) -> RepoResult<Customer> {
        customer.validate()?;

        unit_of_work(self.conn, cancel, "customer_update", |tx| {
            let changed = tx.execute(
                "UPDATE Customers SET Name = ?1 WHERE CustomerId = ?2;",
                params![customer.name.as_str(), customer.id],
            )?;
            let not_found = RepoError::NotFound {
                kind: EntityKind::Customer,
                id: customer.id,
            };
            if changed == 0 {
                return Err(not_found);
            }
            load_customer(tx, customer.id)?.ok_or(not_found)
        })
    }

    fn delete_customer(&self, id: CustomerId, cancel: &CancellationToken) -> RepoResult<()> {
        unit_of_work(self.conn, cancel, "customer_delete", |tx| {
            let changed = tx.execute("DELETE FROM Customers WHERE CustomerId = ?1;", [id])?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    kind: EntityKind::Customer,
                    id,
                });
            }
            Ok(())
        })
    }
}

fn load_customer(conn: &Connection, id: CustomerId) -> RepoResult<Option<Customer>> {
    let mut stmt = conn.prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE CustomerId = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_customer_row(row)?));
    }
    Ok(None)
}

fn parse_customer_row(row: &Row<'_>) -> RepoResult<Customer> {
    Ok(Customer {
        id: row.get("CustomerId")?,
        name: row.get("Name")?,
    })
}
