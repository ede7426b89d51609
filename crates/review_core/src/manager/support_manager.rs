//! Support comment use-cases.
//!
//! # Invariants
//! - A comment is only inserted after its review has been found.
//! - `created_date` comes from the injected clock, never from the caller.
//! - `add_multiple_comments` inserts in input order with one transaction per
//!   comment; a failure or cancellation midway keeps the committed prefix.
//! - Batch comments read the clock once each, immediately before insert.

use super::{ManagerError, ManagerResult};
use crate::clock::Clock;
use crate::handler::comment_handler::{CommentHandler, SqliteCommentHandler};
use crate::handler::review_handler::{ReviewHandler, SqliteReviewHandler};
use crate::handler::RepoResult;
use crate::model::comment::{validate_comment_fields, Comment, CommentId, NewComment};
use crate::model::review::ReviewId;
use crate::model::EntityKind;
use log::{info, warn};
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

/// Manager over comment and review handlers.
pub struct SupportManager<M: CommentHandler, R: ReviewHandler, K: Clock> {
    comments: M,
    reviews: R,
    clock: K,
}

/// Support manager wired to SQLite handlers sharing one connection.
pub type SqliteSupportManager<'conn, K> =
    SupportManager<SqliteCommentHandler<'conn>, SqliteReviewHandler<'conn>, K>;

impl<'conn, K: Clock> SupportManager<SqliteCommentHandler<'conn>, SqliteReviewHandler<'conn>, K> {
    pub fn from_connection(conn: &'conn Connection, clock: K) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteCommentHandler::try_new(conn)?,
            SqliteReviewHandler::try_new(conn)?,
            clock,
        ))
    }
}

impl<M: CommentHandler, R: ReviewHandler, K: Clock> SupportManager<M, R, K> {
    pub fn new(comments: M, reviews: R, clock: K) -> Self {
        Self {
            comments,
            reviews,
            clock,
        }
    }

    /// Attaches a comment to an existing review, stamped with the current time.
    ///
    /// # Errors
    /// - [`ManagerError::NotFound`] with [`EntityKind::Review`] when the review
    ///   does not exist.
    pub fn add_comment(
        &self,
        review_id: ReviewId,
        comment_text: impl Into<String>,
        created_by: impl Into<String>,
        cancel: &CancellationToken,
    ) -> ManagerResult<Comment> {
        self.require_review(review_id, "comment_add", cancel)?;

        let created = self.comments.add_comment(
            &NewComment {
                review_id,
                comment_text: comment_text.into(),
                created_by: created_by.into(),
                created_date: self.clock.now(),
            },
            cancel,
        )?;
        info!(
            "event=comment_add module=manager status=ok comment_id={} review_id={}",
            created.id, review_id
        );
        Ok(created)
    }

    pub fn get_comment(
        &self,
        id: CommentId,
        cancel: &CancellationToken,
    ) -> ManagerResult<Option<Comment>> {
        Ok(self.comments.get_comment(id, cancel)?)
    }

    /// Lists the comments of one review, oldest first.
    pub fn list_comments_by_review(
        &self,
        review_id: ReviewId,
        cancel: &CancellationToken,
    ) -> ManagerResult<Vec<Comment>> {
        Ok(self.comments.list_comments_by_review(review_id, cancel)?)
    }

    /// Replaces the text of an existing comment; every other field is kept.
    pub fn update_comment(
        &self,
        id: CommentId,
        new_text: impl Into<String>,
        cancel: &CancellationToken,
    ) -> ManagerResult<Comment> {
        let mut existing =
            self.comments
                .get_comment(id, cancel)?
                .ok_or(ManagerError::NotFound {
                    kind: EntityKind::Comment,
                    id,
                })?;

        existing.comment_text = new_text.into();
        let updated = self.comments.update_comment(&existing, cancel)?;
        info!("event=comment_update module=manager status=ok comment_id={id}");
        Ok(updated)
    }

    pub fn delete_comment(&self, id: CommentId, cancel: &CancellationToken) -> ManagerResult<()> {
        self.comments.delete_comment(id, cancel)?;
        info!("event=comment_delete module=manager status=ok comment_id={id}");
        Ok(())
    }

    /// Adds several comments to one review, in input order.
    ///
    /// The review is checked once and every entry is validated before the
    /// first insert, so a blank entry rejects the whole batch without
    /// writing. Each comment is stamped right before its own insert.
    pub fn add_multiple_comments<I, T, A>(
        &self,
        review_id: ReviewId,
        comments: I,
        cancel: &CancellationToken,
    ) -> ManagerResult<Vec<Comment>>
    where
        I: IntoIterator<Item = (T, A)>,
        T: Into<String>,
        A: Into<String>,
    {
        self.require_review(review_id, "comment_add_many", cancel)?;

        let entries: Vec<(String, String)> = comments
            .into_iter()
            .map(|(comment_text, created_by)| (comment_text.into(), created_by.into()))
            .collect();
        for (comment_text, created_by) in &entries {
            validate_comment_fields(comment_text, created_by)
                .map_err(|err| ManagerError::Repo(err.into()))?;
        }

        let mut added = Vec::with_capacity(entries.len());
        for (comment_text, created_by) in entries {
            let draft = NewComment {
                review_id,
                comment_text,
                created_by,
                created_date: self.clock.now(),
            };
            added.push(self.comments.add_comment(&draft, cancel)?);
        }

        info!(
            "event=comment_add_many module=manager status=ok review_id={review_id} count={}",
            added.len()
        );
        Ok(added)
    }

    fn require_review(
        &self,
        review_id: ReviewId,
        event: &'static str,
        cancel: &CancellationToken,
    ) -> ManagerResult<()> {
        if self.reviews.get_review(review_id, cancel)?.is_none() {
            warn!(
                "event={event} module=manager status=error error_code=review_not_found review_id={review_id}"
            );
            return Err(ManagerError::NotFound {
                kind: EntityKind::Review,
                id: review_id,
            });
        }
        Ok(())
    }
}
