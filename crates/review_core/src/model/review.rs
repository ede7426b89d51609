//! Review records and the rating scale.
//!
//! # Invariants
//! - `ReviewRating` ordinals are stable (`Poor = 0` .. `Excellent = 4`); the
//!   store persists the ordinal.
//! - A fetched `Review` always carries its owning customer and its comments
//!   ordered by creation date.

use super::comment::Comment;
use super::customer::{Customer, CustomerId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned review identifier.
pub type ReviewId = i64;

/// Five-step rating scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReviewRating {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl ReviewRating {
    pub const ALL: [ReviewRating; 5] = [
        Self::Poor,
        Self::Fair,
        Self::Good,
        Self::VeryGood,
        Self::Excellent,
    ];

    pub fn ordinal(self) -> i64 {
        match self {
            Self::Poor => 0,
            Self::Fair => 1,
            Self::Good => 2,
            Self::VeryGood => 3,
            Self::Excellent => 4,
        }
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::VeryGood => "VeryGood",
            Self::Excellent => "Excellent",
        }
    }
}

impl Display for ReviewRating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rating `{0}`; expected Poor|Fair|Good|VeryGood|Excellent")]
pub struct ParseRatingError(pub String);

impl FromStr for ReviewRating {
    type Err = ParseRatingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|rating| rating.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseRatingError(trimmed.to_string()))
    }
}

/// Draft for a review that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub customer_id: CustomerId,
    pub rating: ReviewRating,
}

/// Persisted review with its eager-loaded relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub customer_id: CustomerId,
    pub rating: ReviewRating,
    /// Owning customer.
    pub customer: Customer,
    /// Ordered by `created_date ASC, id ASC`.
    pub comments: Vec<Comment>,
}

impl Review {
    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            id: self.id,
            customer_id: self.customer_id,
            rating: self.rating,
        }
    }
}

/// Review columns without relations; attached to single-comment reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub id: ReviewId,
    pub customer_id: CustomerId,
    pub rating: ReviewRating,
}
