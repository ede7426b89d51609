use chrono::{Duration, TimeZone, Utc};
use review_core::db::open_db_in_memory;
use review_core::handler::RepoResult;
use review_core::{
    CancellationToken, Clock, Comment, CommentHandler, CommentId, EntityKind, ManagerError,
    NewComment, NewCustomer, NewReview, RepoError, Review, ReviewId, ReviewRating,
    SqliteCommentHandler, SqliteCustomerManager, SqliteReviewHandler, SqliteSupportManager,
    SteppingClock, SupportManager, SystemClock,
};
use rusqlite::Connection;
use std::cell::Cell;

fn seed_review(conn: &Connection) -> Review {
    let cancel = CancellationToken::new();
    let customers = SqliteCustomerManager::from_connection(conn).unwrap();
    let customer = customers
        .add_customer(&NewCustomer::new("Test Customer"), &cancel)
        .unwrap();
    customers
        .add_review(
            &NewReview {
                customer_id: customer.id,
                rating: ReviewRating::Good,
            },
            &cancel,
        )
        .unwrap()
}

fn stepping_clock() -> SteppingClock {
    SteppingClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        Duration::seconds(1),
    )
}

/// Comment handler that counts inserts and can cancel after a number of them.
struct CountingComments<'conn> {
    inner: SqliteCommentHandler<'conn>,
    adds: Cell<usize>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl<'conn> CountingComments<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteCommentHandler::try_new(conn).unwrap(),
            adds: Cell::new(0),
            cancel_after: None,
        }
    }
}

impl CommentHandler for &CountingComments<'_> {
    fn add_comment(&self, comment: &NewComment, cancel: &CancellationToken) -> RepoResult<Comment> {
        let created = self.inner.add_comment(comment, cancel)?;
        self.adds.set(self.adds.get() + 1);
        if let Some((limit, token)) = &self.cancel_after {
            if self.adds.get() >= *limit {
                token.cancel();
            }
        }
        Ok(created)
    }

    fn get_comment(
        &self,
        id: CommentId,
        cancel: &CancellationToken,
    ) -> RepoResult<Option<Comment>> {
        self.inner.get_comment(id, cancel)
    }

    fn list_comments_by_review(
        &self,
        review_id: ReviewId,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<Comment>> {
        self.inner.list_comments_by_review(review_id, cancel)
    }

    fn update_comment(&self, comment: &Comment, cancel: &CancellationToken) -> RepoResult<Comment> {
        self.inner.update_comment(comment, cancel)
    }

    fn delete_comment(&self, id: CommentId, cancel: &CancellationToken) -> RepoResult<()> {
        self.inner.delete_comment(id, cancel)
    }
}

#[test]
fn add_comment_stamps_clock_time_and_links_review() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let manager = SqliteSupportManager::from_connection(&conn, stepping_clock()).unwrap();
    let cancel = CancellationToken::new();

    let comment = manager
        .add_comment(review.id, "Thanks for the feedback", "agent-7", &cancel)
        .unwrap();

    assert_eq!(comment.review_id, review.id);
    assert_eq!(comment.created_by, "agent-7");
    assert_eq!(
        comment.created_date,
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    );
    assert_eq!(comment.review, Some(review.summary()));
    assert_eq!(
        manager.get_comment(comment.id, &cancel).unwrap(),
        Some(comment)
    );
}

#[test]
fn add_comment_to_missing_review_fails_with_not_found() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteSupportManager::from_connection(&conn, SystemClock).unwrap();

    let err = manager
        .add_comment(321, "orphan", "agent", &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::NotFound {
            kind: EntityKind::Review,
            id: 321
        }
    ));
}

#[test]
fn comments_list_in_insertion_order_with_system_clock() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let manager = SqliteSupportManager::from_connection(&conn, SystemClock).unwrap();
    let cancel = CancellationToken::new();

    for text in ["one", "two", "three", "four"] {
        manager.add_comment(review.id, text, "agent", &cancel).unwrap();
    }

    let listed = manager.list_comments_by_review(review.id, &cancel).unwrap();
    let texts: Vec<_> = listed.iter().map(|c| c.comment_text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three", "four"]);
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].created_date <= pair[1].created_date));
}

#[test]
fn update_comment_only_changes_text() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let manager = SqliteSupportManager::from_connection(&conn, stepping_clock()).unwrap();
    let cancel = CancellationToken::new();

    let original = manager
        .add_comment(review.id, "first draft", "agent", &cancel)
        .unwrap();
    let updated = manager
        .update_comment(original.id, "final wording", &cancel)
        .unwrap();

    assert_eq!(updated.comment_text, "final wording");
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.review_id, original.review_id);
    assert_eq!(updated.created_date, original.created_date);
    assert_eq!(updated.created_by, original.created_by);
}

#[test]
fn update_and_delete_missing_comment_fail_with_not_found() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteSupportManager::from_connection(&conn, SystemClock).unwrap();
    let cancel = CancellationToken::new();

    let update_err = manager.update_comment(8, "text", &cancel).unwrap_err();
    assert!(matches!(
        update_err,
        ManagerError::NotFound {
            kind: EntityKind::Comment,
            id: 8
        }
    ));

    let delete_err = manager.delete_comment(8, &cancel).unwrap_err();
    assert!(delete_err.is_not_found());
}

#[test]
fn delete_comment_then_get_is_absent() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let manager = SqliteSupportManager::from_connection(&conn, SystemClock).unwrap();
    let cancel = CancellationToken::new();

    let comment = manager.add_comment(review.id, "temp", "agent", &cancel).unwrap();
    manager.delete_comment(comment.id, &cancel).unwrap();

    assert_eq!(manager.get_comment(comment.id, &cancel).unwrap(), None);
}

#[test]
fn add_multiple_comments_preserves_input_order() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let manager = SqliteSupportManager::from_connection(&conn, stepping_clock()).unwrap();
    let cancel = CancellationToken::new();

    let input = vec![
        ("alpha", "agent-1"),
        ("beta", "agent-2"),
        ("gamma", "agent-1"),
    ];
    let added = manager
        .add_multiple_comments(review.id, input.clone(), &cancel)
        .unwrap();

    assert_eq!(added.len(), input.len());
    for (comment, (text, author)) in added.iter().zip(&input) {
        assert_eq!(comment.comment_text, *text);
        assert_eq!(comment.created_by, *author);
        assert_eq!(comment.review_id, review.id);
    }
    assert!(added.windows(2).all(|pair| pair[0].id < pair[1].id));

    let listed = manager.list_comments_by_review(review.id, &cancel).unwrap();
    let listed_ids: Vec<_> = listed.iter().map(|c| c.id).collect();
    let added_ids: Vec<_> = added.iter().map(|c| c.id).collect();
    assert_eq!(listed_ids, added_ids);
}

#[test]
fn add_multiple_comments_with_empty_input_inserts_nothing() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let comments = CountingComments::new(&conn);
    let manager = SupportManager::new(
        &comments,
        SqliteReviewHandler::try_new(&conn).unwrap(),
        SystemClock,
    );
    let cancel = CancellationToken::new();

    let added = manager
        .add_multiple_comments(review.id, Vec::<(String, String)>::new(), &cancel)
        .unwrap();

    assert!(added.is_empty());
    assert_eq!(comments.adds.get(), 0);
}

#[test]
fn add_multiple_comments_to_missing_review_fails_before_inserting() {
    let conn = open_db_in_memory().unwrap();
    let comments = CountingComments::new(&conn);
    let manager = SupportManager::new(
        &comments,
        SqliteReviewHandler::try_new(&conn).unwrap(),
        SystemClock,
    );

    let err = manager
        .add_multiple_comments(77, [("x", "y")], &CancellationToken::new())
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(comments.adds.get(), 0);
}

#[test]
fn add_multiple_comments_rejects_blank_entry_before_any_insert() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let manager = SqliteSupportManager::from_connection(&conn, SystemClock).unwrap();
    let cancel = CancellationToken::new();

    let err = manager
        .add_multiple_comments(review.id, [("fine", "agent"), ("  ", "agent")], &cancel)
        .unwrap_err();
    assert!(matches!(err, ManagerError::Repo(RepoError::Validation(_))));
    assert!(manager
        .list_comments_by_review(review.id, &cancel)
        .unwrap()
        .is_empty());
}

#[test]
fn cancellation_midway_keeps_committed_prefix() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let cancel = CancellationToken::new();
    let mut comments = CountingComments::new(&conn);
    comments.cancel_after = Some((2, cancel.clone()));
    let manager = SupportManager::new(
        &comments,
        SqliteReviewHandler::try_new(&conn).unwrap(),
        stepping_clock(),
    );

    let err = manager
        .add_multiple_comments(
            review.id,
            [("one", "a"), ("two", "a"), ("three", "a"), ("four", "a")],
            &cancel,
        )
        .unwrap_err();
    assert!(err.is_cancelled());

    let live = CancellationToken::new();
    let texts: Vec<_> = manager
        .list_comments_by_review(review.id, &live)
        .unwrap()
        .into_iter()
        .map(|comment| comment.comment_text)
        .collect();
    assert_eq!(texts, vec!["one", "two"]);
}

#[test]
fn end_to_end_comment_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let cancel = CancellationToken::new();
    let customers = SqliteCustomerManager::from_connection(&conn).unwrap();
    let support = SqliteSupportManager::from_connection(&conn, stepping_clock()).unwrap();

    let customer = customers
        .add_customer(&NewCustomer::new("Test Customer"), &cancel)
        .unwrap();
    let review = customers
        .add_review(
            &NewReview {
                customer_id: customer.id,
                rating: ReviewRating::Good,
            },
            &cancel,
        )
        .unwrap();

    let added = support
        .add_multiple_comments(
            review.id,
            [
                ("First", "support"),
                ("Second", "support"),
                ("Third", "support"),
            ],
            &cancel,
        )
        .unwrap();

    let listed = support.list_comments_by_review(review.id, &cancel).unwrap();
    let texts: Vec<_> = listed.iter().map(|c| c.comment_text.as_str()).collect();
    assert_eq!(texts, vec!["First", "Second", "Third"]);

    support
        .update_comment(added[0].id, "First (edited)", &cancel)
        .unwrap();
    support.delete_comment(added[1].id, &cancel).unwrap();

    let remaining = support.list_comments_by_review(review.id, &cancel).unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining
        .iter()
        .any(|comment| comment.comment_text == "First (edited)"));
    assert!(remaining.iter().all(|comment| comment.id != added[1].id));

    let reloaded = customers.get_review(review.id, &cancel).unwrap().unwrap();
    assert_eq!(reloaded.comments, remaining);
}

#[test]
fn batch_reads_the_clock_once_per_insert_attempt() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let cancel = CancellationToken::new();
    let clock = stepping_clock();
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let mut comments = CountingComments::new(&conn);
    comments.cancel_after = Some((2, cancel.clone()));
    let manager = SupportManager::new(
        &comments,
        SqliteReviewHandler::try_new(&conn).unwrap(),
        &clock,
    );

    let err = manager
        .add_multiple_comments(
            review.id,
            [("one", "a"), ("two", "a"), ("three", "a"), ("four", "a")],
            &cancel,
        )
        .unwrap_err();
    assert!(err.is_cancelled());

    let live = CancellationToken::new();
    let stored = manager.list_comments_by_review(review.id, &live).unwrap();
    let dates: Vec<_> = stored.iter().map(|comment| comment.created_date).collect();
    assert_eq!(dates, vec![start, start + Duration::seconds(1)]);
    // The third entry was stamped, then refused; the fourth never was.
    assert_eq!(clock.now(), start + Duration::seconds(3));
}

#[test]
fn managers_sharing_one_clock_stamp_in_call_order() {
    let conn = open_db_in_memory().unwrap();
    let review = seed_review(&conn);
    let cancel = CancellationToken::new();
    let clock = stepping_clock();
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let front_desk = SqliteSupportManager::from_connection(&conn, &clock).unwrap();
    let escalation = SqliteSupportManager::from_connection(&conn, &clock).unwrap();

    let first = front_desk
        .add_comment(review.id, "received", "desk", &cancel)
        .unwrap();
    let second = escalation
        .add_comment(review.id, "escalated", "tier-2", &cancel)
        .unwrap();
    let third = front_desk
        .add_comment(review.id, "closed", "desk", &cancel)
        .unwrap();

    assert_eq!(first.created_date, start);
    assert_eq!(second.created_date, start + Duration::seconds(1));
    assert_eq!(third.created_date, start + Duration::seconds(2));
}
