//! Core domain logic for the customer review service.
//! Managers in this crate are the only entry points callers should need.

pub mod clock;
pub mod config;
pub mod db;
pub mod handler;
pub mod logging;
pub mod manager;
pub mod model;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use config::StoreTarget;
pub use handler::comment_handler::{CommentHandler, SqliteCommentHandler};
pub use handler::customer_handler::{CustomerHandler, SqliteCustomerHandler};
pub use handler::review_handler::{ReviewFilter, ReviewHandler, SqliteReviewHandler};
pub use handler::{RepoError, RepoResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use manager::customer_manager::{CustomerManager, SqliteCustomerManager};
pub use manager::support_manager::{SqliteSupportManager, SupportManager};
pub use manager::{ManagerError, ManagerResult};
pub use model::comment::{validate_comment_fields, Comment, CommentId, NewComment};
pub use model::customer::{Customer, CustomerId, NewCustomer};
pub use model::review::{NewReview, ParseRatingError, Review, ReviewId, ReviewRating, ReviewSummary};
pub use model::{EntityKind, ValidationError};
pub use tokio_util::sync::CancellationToken;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
