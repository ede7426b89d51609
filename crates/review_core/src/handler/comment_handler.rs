//! Comment handler contract and SQLite implementation.
//!
//! # Invariants
//! - Comments of one review are listed by `CreatedDate ASC, CommentId ASC`,
//!   so comments stamped within the same millisecond keep insertion order.
//! - `CreatedDate` is written on insert only.
//! - Single-comment reads attach the owning review summary.

use super::{
    datetime_to_db, ensure_connection_ready, parse_datetime, parse_rating, RepoError, RepoResult,
};
use crate::db::gateway::{check_cancelled, read_snapshot, unit_of_work};
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::model::review::{ReviewId, ReviewSummary};
use crate::model::EntityKind;
use rusqlite::{params, Connection, Row};
use tokio_util::sync::CancellationToken;

const COMMENT_SELECT_SQL: &str = "SELECT
    CommentId,
    ReviewId,
    CommentText,
    CreatedDate,
    CreatedBy
FROM Comments";

/// CRUD contract over the `Comments` table.
pub trait CommentHandler {
    fn add_comment(&self, comment: &NewComment, cancel: &CancellationToken)
        -> RepoResult<Comment>;
    fn get_comment(
        &self,
        id: CommentId,
        cancel: &CancellationToken,
    ) -> RepoResult<Option<Comment>>;
    fn list_comments_by_review(
        &self,
        review_id: ReviewId,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<Comment>>;
    /// Overwrites `comment_text` and `created_by`; other columns are kept.
    fn update_comment(&self, comment: &Comment, cancel: &CancellationToken)
        -> RepoResult<Comment>;
    fn delete_comment(&self, id: CommentId, cancel: &CancellationToken) -> RepoResult<()>;
}

/// SQLite-backed comment handler.
#[derive(Debug, Clone, Copy)]
pub struct SqliteCommentHandler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentHandler<'conn> {
    /// Creates a handler from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["Reviews", "Comments"])?;
        Ok(Self { conn })
    }
}

impl CommentHandler for SqliteCommentHandler<'_> {
    fn add_comment(
        &self,
        comment: &NewComment,
        cancel: &CancellationToken,
    ) -> RepoResult<Comment> {
        comment.validate()?;

        unit_of_work(self.conn, cancel, "comment_add", |tx| {
            tx.execute(
                "INSERT INTO Comments (
                    ReviewId,
                    CommentText,
                    CreatedDate,
                    CreatedBy
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    comment.review_id,
                    comment.comment_text.as_str(),
                    datetime_to_db(comment.created_date),
                    comment.created_by.as_str(),
                ],
            )?;
            let id = tx.last_insert_rowid();
            load_comment_with_review(tx, id)?.ok_or(RepoError::NotFound {
                kind: EntityKind::Comment,
                id,
            })
        })
    }

    fn get_comment(
        &self,
        id: CommentId,
        cancel: &CancellationToken,
    ) -> RepoResult<Option<Comment>> {
        read_snapshot(self.conn, cancel, "comment_get", |tx| load_comment_with_review(tx, id))
    }

    fn list_comments_by_review(
        &self,
        review_id: ReviewId,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<Comment>> {
        check_cancelled(cancel, "comment_list_by_review")?;
        load_comments_for_review(self.conn, review_id)
    }

    fn update_comment(
        &self,
        comment: &Comment,
        cancel: &CancellationToken,
    ) -> RepoResult<Comment> {
        comment.validate()?;

        unit_of_work(self.conn, cancel, "comment_update", |tx| {
            let changed = tx.execute(
                "UPDATE Comments
                 SET
                    CommentText = ?1,
                    CreatedBy = ?2
                 WHERE CommentId = ?3;",
                params![
                    comment.comment_text.as_str(),
                    comment.created_by.as_str(),
                    comment.id,
                ],
            )?;
            let not_found = RepoError::NotFound {
                kind: EntityKind::Comment,
                id: comment.id,
            };
            if changed == 0 {
                return Err(not_found);
            }
            load_comment_with_review(tx, comment.id)?.ok_or(not_found)
        })
    }

    fn delete_comment(&self, id: CommentId, cancel: &CancellationToken) -> RepoResult<()> {
        unit_of_work(self.conn, cancel, "comment_delete", |tx| {
            let changed = tx.execute("DELETE FROM Comments WHERE CommentId = ?1;", [id])?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    kind: EntityKind::Comment,
                    id,
                });
            }
            Ok(())
        })
    }
}

/// Loads all comments of one review in display order, without review summaries.
pub(crate) fn load_comments_for_review(
    conn: &Connection,
    review_id: ReviewId,
) -> RepoResult<Vec<Comment>> {
    let mut stmt = conn.prepare(&format!(
        "{COMMENT_SELECT_SQL}
         WHERE ReviewId = ?1
         ORDER BY CreatedDate ASC, CommentId ASC;"
    ))?;
    let mut rows = stmt.query([review_id])?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(parse_comment_row(row)?);
    }
    Ok(comments)
}

fn load_comment_with_review(conn: &Connection, id: CommentId) -> RepoResult<Option<Comment>> {
    let mut stmt = conn.prepare(&format!("{COMMENT_SELECT_SQL} WHERE CommentId = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut comment = parse_comment_row(row)?;
    let review = load_review_summary(conn, comment.review_id)?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "comment {} references missing review {}",
            comment.id, comment.review_id
        ))
    })?;
    comment.review = Some(review);
    Ok(Some(comment))
}

fn load_review_summary(
    conn: &Connection,
    review_id: ReviewId,
) -> RepoResult<Option<ReviewSummary>> {
    let mut stmt = conn.prepare(
        "SELECT ReviewId, CustomerId, Rating
         FROM Reviews
         WHERE ReviewId = ?1;",
    )?;
    let mut rows = stmt.query([review_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(ReviewSummary {
            id: row.get("ReviewId")?,
            customer_id: row.get("CustomerId")?,
            rating: parse_rating(row.get("Rating")?, "Reviews.Rating")?,
        }));
    }
    Ok(None)
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    Ok(Comment {
        id: row.get("CommentId")?,
        review_id: row.get("ReviewId")?,
        comment_text: row.get("CommentText")?,
        created_date: parse_datetime(row.get("CreatedDate")?, "Comments.CreatedDate")?,
        created_by: row.get("CreatedBy")?,
        review: None,
    })
}
