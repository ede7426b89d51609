//! `review-cli`: command-line front end over `review_core` managers.
//!
//! # Responsibility
//! - Parse arguments, open the store named by `--connectionString`.
//! - Print results as plain text or, with `--json`, as JSON.
//!
//! Failures propagate as `anyhow::Error`; `main` returning `Err` prints
//! `Error: <message>` and exits non-zero.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use review_core::db::open_target;
use review_core::{
    default_log_level, init_logging, validate_comment_fields, CancellationToken, Customer,
    CustomerId, NewCustomer, NewReview, Review, ReviewId, ReviewRating, SqliteCustomerManager,
    SqliteSupportManager, StoreTarget, SystemClock,
};
use rusqlite::Connection;
use serde::Serialize;

const SYSTEM_AUTHOR: &str = "System";

#[derive(Parser, Debug)]
#[command(name = "review-cli")]
#[command(version)]
#[command(about = "Manage customer reviews and support comments", long_about = None)]
struct Args {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    /// Absolute directory for log files; logging is off when unset
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a review for an existing customer, with an initial comment
    #[command(name = "add-review")]
    AddReview {
        /// Id of the reviewing customer
        #[arg(short = 'c', long = "customerId")]
        customer_id: CustomerId,

        /// Poor, Fair, Good, VeryGood or Excellent
        #[arg(short = 'r', long = "rating")]
        rating: ReviewRating,

        /// Text of the initial comment
        #[arg(short = 'm', long = "comment")]
        comment: String,

        /// SQLite file path, `:memory:` or `Data Source=<path>`
        #[arg(long = "connectionString")]
        connection_string: String,
    },

    /// Register a customer
    #[command(name = "add-customer")]
    AddCustomer {
        #[arg(short = 'n', long = "name")]
        name: String,

        #[arg(long = "connectionString")]
        connection_string: String,
    },

    /// Show a review with its customer and comments
    #[command(name = "show-review")]
    ShowReview {
        #[arg(long = "reviewId")]
        review_id: ReviewId,

        #[arg(long = "connectionString")]
        connection_string: String,
    },
}

#[derive(Debug, Serialize)]
struct AddedReview<'a> {
    review_id: ReviewId,
    customer_name: &'a str,
    rating: ReviewRating,
    comment: &'a str,
}

fn main() -> Result<()> {
    let args = Args::parse();
    start_logging(&args)?;

    let cancel = CancellationToken::new();
    match args.command {
        Commands::AddReview {
            customer_id,
            rating,
            comment,
            connection_string,
        } => {
            let conn = open_store(&connection_string)?;
            let review = add_review(&conn, customer_id, rating, &comment, &cancel)?;
            print_added_review(&review, &comment, args.json)
        }
        Commands::AddCustomer {
            name,
            connection_string,
        } => {
            let conn = open_store(&connection_string)?;
            let customer = add_customer(&conn, &name, &cancel)?;
            print_customer(&customer, args.json)
        }
        Commands::ShowReview {
            review_id,
            connection_string,
        } => {
            let conn = open_store(&connection_string)?;
            let review = SqliteCustomerManager::from_connection(&conn)?
                .get_review(review_id, &cancel)
                .with_context(|| format!("failed to load review {review_id}"))?;
            print_review(review_id, review.as_ref(), args.json)
        }
    }
}

fn start_logging(args: &Args) -> Result<()> {
    let Some(log_dir) = args.log_dir.as_deref() else {
        return Ok(());
    };
    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, log_dir)
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;
    info!("event=cli_start module=cli status=ok");
    Ok(())
}

fn open_store(connection_string: &str) -> Result<Connection> {
    let target =
        StoreTarget::parse(connection_string).context("failed to parse connection string")?;
    open_target(&target).context("failed to open review store")
}

/// Verifies the customer, adds the review and attaches `comment` as its
/// first comment. A blank comment is rejected before anything is written.
fn add_review(
    conn: &Connection,
    customer_id: CustomerId,
    rating: ReviewRating,
    comment: &str,
    cancel: &CancellationToken,
) -> Result<Review> {
    validate_comment_fields(comment, SYSTEM_AUTHOR).context("invalid review comment")?;

    let customers = SqliteCustomerManager::from_connection(conn)?;
    let support = SqliteSupportManager::from_connection(conn, SystemClock)?;

    let created = customers
        .add_review(
            &NewReview {
                customer_id,
                rating,
            },
            cancel,
        )
        .with_context(|| format!("failed to add review for customer {customer_id}"))?;
    support
        .add_comment(created.id, comment, SYSTEM_AUTHOR, cancel)
        .with_context(|| format!("failed to add comment to review {}", created.id))?;

    customers
        .get_review(created.id, cancel)?
        .ok_or_else(|| anyhow!("review {} vanished after insert", created.id))
}

fn add_customer(conn: &Connection, name: &str, cancel: &CancellationToken) -> Result<Customer> {
    SqliteCustomerManager::from_connection(conn)?
        .add_customer(&NewCustomer::new(name), cancel)
        .context("failed to add customer")
}

fn print_added_review(review: &Review, comment: &str, json: bool) -> Result<()> {
    if json {
        let added = AddedReview {
            review_id: review.id,
            customer_name: &review.customer.name,
            rating: review.rating,
            comment,
        };
        println!("{}", serde_json::to_string_pretty(&added)?);
        return Ok(());
    }

    println!("Review added successfully.");
    println!("Review ID: {}", review.id);
    println!("Customer: {}", review.customer.name);
    println!("Rating: {}", review.rating);
    println!("Comment: {comment}");
    Ok(())
}

fn print_customer(customer: &Customer, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(customer)?);
    } else {
        println!("Customer added: {} (ID: {})", customer.name, customer.id);
    }
    Ok(())
}

fn print_review(review_id: ReviewId, review: Option<&Review>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&review)?);
        return Ok(());
    }

    let Some(review) = review else {
        println!("Review {review_id} not found.");
        return Ok(());
    };
    println!("Review ID: {}", review.id);
    println!("Customer: {} (ID: {})", review.customer.name, review.customer_id);
    println!("Rating: {}", review.rating);
    for comment in &review.comments {
        println!(
            "- [{}] {}: {}",
            comment.created_date.format("%Y-%m-%d %H:%M:%S"),
            comment.created_by,
            comment.comment_text
        );
    }
    Ok(())
}
