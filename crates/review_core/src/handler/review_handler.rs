//! Review handler contract and SQLite implementation.
//!
//! # Invariants
//! - Every returned `Review` carries its customer and its ordered comments.
//! - Lists are ordered by `ReviewId ASC`.
//! - Deleting a review removes its comments through `ON DELETE CASCADE`.
//! - A review and its eager-loaded rows are read from one snapshot.

use super::comment_handler::load_comments_for_review;
use super::{ensure_connection_ready, parse_rating, RepoError, RepoResult};
use crate::db::gateway::{read_snapshot, unit_of_work};
use crate::model::customer::{Customer, CustomerId};
use crate::model::review::{NewReview, Review, ReviewId, ReviewRating};
use crate::model::EntityKind;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use tokio_util::sync::CancellationToken;

const REVIEW_SELECT_SQL: &str = "SELECT
    r.ReviewId AS ReviewId,
    r.CustomerId AS CustomerId,
    r.Rating AS Rating,
    c.Name AS CustomerName
FROM Reviews r
INNER JOIN Customers c ON c.CustomerId = r.CustomerId";

/// Filter options for listing reviews. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub customer_id: Option<CustomerId>,
    pub rating: Option<ReviewRating>,
}

impl ReviewFilter {
    pub fn by_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn by_rating(rating: ReviewRating) -> Self {
        Self {
            rating: Some(rating),
            ..Self::default()
        }
    }
}

/// CRUD contract over the `Reviews` table.
pub trait ReviewHandler {
    /// Inserts the review. The customer is not checked here; see
    /// [`crate::manager::customer_manager::CustomerManager::add_review`].
    fn add_review(&self, review: &NewReview, cancel: &CancellationToken) -> RepoResult<Review>;
    fn get_review(&self, id: ReviewId, cancel: &CancellationToken)
        -> RepoResult<Option<Review>>;
    fn list_reviews(
        &self,
        filter: &ReviewFilter,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<Review>>;
    /// Overwrites `customer_id` and `rating` and returns the stored state.
    fn update_review(&self, review: &Review, cancel: &CancellationToken) -> RepoResult<Review>;
    fn delete_review(&self, id: ReviewId, cancel: &CancellationToken) -> RepoResult<()>;
}

/// SQLite-backed review handler.
#[derive(Debug, Clone, Copy)]
pub struct SqliteReviewHandler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewHandler<'conn> {
    /// Creates a handler from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["Customers", "Reviews", "Comments"])?;
        Ok(Self { conn })
    }
}

impl ReviewHandler for SqliteReviewHandler<'_> {
    fn add_review(&self, review: &NewReview, cancel: &CancellationToken) -> RepoResult<Review> {
        unit_of_work(self.conn, cancel, "review_add", |tx| {
            tx.execute(
                "INSERT INTO Reviews (CustomerId, Rating) VALUES (?1, ?2);",
                params![review.customer_id, review.rating.ordinal()],
            )?;
            let id = tx.last_insert_rowid();
            load_review(tx, id)?.ok_or(RepoError::NotFound {
                kind: EntityKind::Review,
                id,
            })
        })
    }

    fn get_review(
        &self,
        id: ReviewId,
        cancel: &CancellationToken,
    ) -> RepoResult<Option<Review>> {
        read_snapshot(self.conn, cancel, "review_get", |tx| load_review(tx, id))
    }

    fn list_reviews(
        &self,
        filter: &ReviewFilter,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<Review>> {
        let mut sql = format!("{REVIEW_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(customer_id) = filter.customer_id {
            sql.push_str(" AND r.CustomerId = ?");
            bind_values.push(Value::Integer(customer_id));
        }

        if let Some(rating) = filter.rating {
            sql.push_str(" AND r.Rating = ?");
            bind_values.push(Value::Integer(rating.ordinal()));
        }

        sql.push_str(" ORDER BY r.ReviewId ASC;");

        read_snapshot(self.conn, cancel, "review_list", |tx| {
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut reviews = Vec::new();
            while let Some(row) = rows.next()? {
                reviews.push(parse_review_row(tx, row)?);
            }
            Ok(reviews)
        })
    }

    fn update_review(&self, review: &Review, cancel: &CancellationToken) -> RepoResult<Review> {
        unit_of_work(self.conn, cancel, "review_update", |tx| {
            let changed = tx.execute(
                "UPDATE Reviews
                 SET
                    CustomerId = ?1,
                    Rating = ?2
                 WHERE ReviewId = ?3;",
                params![review.customer_id, review.rating.ordinal(), review.id],
            )?;
            let not_found = RepoError::NotFound {
                kind: EntityKind::Review,
                id: review.id,
            };
            if changed == 0 {
                return Err(not_found);
            }
            load_review(tx, review.id)?.ok_or(not_found)
        })
    }

    fn delete_review(&self, id: ReviewId, cancel: &CancellationToken) -> RepoResult<()> {
        unit_of_work(self.conn, cancel, "review_delete", |tx| {
            let changed = tx.execute("DELETE FROM Reviews WHERE ReviewId = ?1;", [id])?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    kind: EntityKind::Review,
                    id,
                });
            }
            Ok(())
        })
    }
}

fn load_review(conn: &Connection, id: ReviewId) -> RepoResult<Option<Review>> {
    let mut stmt = conn.prepare(&format!("{REVIEW_SELECT_SQL} WHERE r.ReviewId = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_review_row(conn, row)?));
    }
    Ok(None)
}

fn parse_review_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Review> {
    let id: ReviewId = row.get("ReviewId")?;
    let customer_id: CustomerId = row.get("CustomerId")?;
    Ok(Review {
        id,
        customer_id,
        rating: parse_rating(row.get("Rating")?, "Reviews.Rating")?,
        customer: Customer {
            id: customer_id,
            name: row.get("CustomerName")?,
        },
        comments: load_comments_for_review(conn, id)?,
    })
}
