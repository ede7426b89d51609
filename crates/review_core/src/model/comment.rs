//! Support comments attached to reviews.
//!
//! # Invariants
//! - `created_date` is stamped once by the support manager's clock and is
//!   never part of an update.
//! - `comment_text` and `created_by` are non-blank.

use super::require_text;
use super::review::{ReviewId, ReviewSummary};
use super::{EntityKind, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned comment identifier.
pub type CommentId = i64;

/// Draft for a comment that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub review_id: ReviewId,
    pub comment_text: String,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_comment_fields(&self.comment_text, &self.created_by)
    }
}

/// Persisted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub comment_text: String,
    pub created_date: DateTime<Utc>,
    pub created_by: String,
    /// Owning review. Filled by single-comment reads; `None` when the
    /// comment is listed as part of a review or by review id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewSummary>,
}

impl Comment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_comment_fields(&self.comment_text, &self.created_by)
    }
}

/// Checks the caller-supplied comment fields without building a draft.
pub fn validate_comment_fields(
    comment_text: &str,
    created_by: &str,
) -> Result<(), ValidationError> {
    require_text(EntityKind::Comment, "comment_text", comment_text)?;
    require_text(EntityKind::Comment, "created_by", created_by)
}
