//! Customer/review use-cases.
//!
//! # Invariants
//! - A review is only inserted after its customer has been found.

use super::{ManagerError, ManagerResult};
use crate::handler::customer_handler::{CustomerHandler, SqliteCustomerHandler};
use crate::handler::review_handler::{ReviewFilter, ReviewHandler, SqliteReviewHandler};
use crate::handler::RepoResult;
use crate::model::customer::{Customer, CustomerId, NewCustomer};
use crate::model::review::{NewReview, Review, ReviewId};
use crate::model::EntityKind;
use log::{info, warn};
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

/// Manager over customer and review handlers.
pub struct CustomerManager<C: CustomerHandler, R: ReviewHandler> {
    customers: C,
    reviews: R,
}

/// Customer manager wired to SQLite handlers sharing one connection.
pub type SqliteCustomerManager<'conn> =
    CustomerManager<SqliteCustomerHandler<'conn>, SqliteReviewHandler<'conn>>;

impl<'conn> CustomerManager<SqliteCustomerHandler<'conn>, SqliteReviewHandler<'conn>> {
    pub fn from_connection(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteCustomerHandler::try_new(conn)?,
            SqliteReviewHandler::try_new(conn)?,
        ))
    }
}

impl<C: CustomerHandler, R: ReviewHandler> CustomerManager<C, R> {
    pub fn new(customers: C, reviews: R) -> Self {
        Self { customers, reviews }
    }

    /// Creates a customer and returns it with its assigned id.
    pub fn add_customer(
        &self,
        customer: &NewCustomer,
        cancel: &CancellationToken,
    ) -> ManagerResult<Customer> {
        let created = self.customers.add_customer(customer, cancel)?;
        info!(
            "event=customer_add module=manager status=ok customer_id={}",
            created.id
        );
        Ok(created)
    }

    pub fn get_customer(
        &self,
        id: CustomerId,
        cancel: &CancellationToken,
    ) -> ManagerResult<Option<Customer>> {
        Ok(self.customers.get_customer(id, cancel)?)
    }

    /// Adds a review for an existing customer.
    ///
    /// # Errors
    /// - [`ManagerError::NotFound`] with [`EntityKind::Customer`] when
    ///   `review.customer_id` does not resolve. Nothing is persisted.
    pub fn add_review(
        &self,
        review: &NewReview,
        cancel: &CancellationToken,
    ) -> ManagerResult<Review> {
        if self
            .customers
            .get_customer(review.customer_id, cancel)?
            .is_none()
        {
            warn!(
                "event=review_add module=manager status=error error_code=customer_not_found customer_id={}",
                review.customer_id
            );
            return Err(ManagerError::NotFound {
                kind: EntityKind::Customer,
                id: review.customer_id,
            });
        }

        let created = self.reviews.add_review(review, cancel)?;
        info!(
            "event=review_add module=manager status=ok review_id={} customer_id={} rating={}",
            created.id, created.customer_id, created.rating
        );
        Ok(created)
    }

    pub fn get_review(
        &self,
        id: ReviewId,
        cancel: &CancellationToken,
    ) -> ManagerResult<Option<Review>> {
        Ok(self.reviews.get_review(id, cancel)?)
    }

    pub fn list_reviews(
        &self,
        filter: &ReviewFilter,
        cancel: &CancellationToken,
    ) -> ManagerResult<Vec<Review>> {
        Ok(self.reviews.list_reviews(filter, cancel)?)
    }
}
