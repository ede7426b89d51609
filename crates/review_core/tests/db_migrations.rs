use review_core::db::migrations::latest_version;
use review_core::db::{open_db, open_db_in_memory, open_target, DbError};
use review_core::{RepoError, SqliteCustomerHandler, SqliteReviewHandler, StoreTarget};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "Customers");
    assert_table_exists(&conn, "Reviews");
    assert_table_exists(&conn, "Comments");
}

#[test]
fn opened_connection_enforces_foreign_keys() {
    let conn = open_db_in_memory().unwrap();

    let err = conn
        .execute(
            "INSERT INTO Reviews (CustomerId, Rating) VALUES (404, 2);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO Customers (Name) VALUES ('kept');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let name: String = conn_second
        .query_row("SELECT Name FROM Customers;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "kept");
}

#[test]
fn open_target_follows_parsed_connection_string() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.db");
    let connection_string = format!("Data Source={};Mode=ReadWriteCreate", path.display());

    let target = StoreTarget::parse(&connection_string).unwrap();
    let conn = open_target(&target).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert!(path.exists());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn handlers_reject_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteCustomerHandler::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn handlers_reject_connection_without_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE Customers (CustomerId INTEGER PRIMARY KEY, Name TEXT NOT NULL);",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(SqliteCustomerHandler::try_new(&conn).is_ok());
    assert!(matches!(
        SqliteReviewHandler::try_new(&conn),
        Err(RepoError::MissingRequiredTable("Reviews"))
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
