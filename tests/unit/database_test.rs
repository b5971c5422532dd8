//! Unit tests for the SmartMarks database layer (connection + migrations).

use smartmarks::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use smartmarks::database::Database;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_bookmarks_table_and_indexes() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    let count = |kind: &str, name: &str| -> bool {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type=?1 AND name=?2",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap_or(false)
    };

    assert!(count("table", "bookmarks"));
    assert!(count("index", "idx_bookmarks_created_at"));
    assert!(count("index", "idx_bookmarks_user_id"));
}

#[test]
fn test_schema_version_recorded() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let result = smartmarks::database::migrations::run_all(db.connection());
    assert!(result.is_ok(), "Running migrations twice should succeed (idempotent)");
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_open_file_database_persists_rows() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db_path = tmp.path().join("test.db");

    {
        let db = Database::open(&db_path).expect("open failed");
        db.connection()
            .execute(
                "INSERT INTO bookmarks (id, title, url, created_at, user_id) VALUES ('a', 'A', 'https://a.dev', '2024-01-01T00:00:00.000000Z', 'u1')",
                [],
            )
            .expect("insert failed");
    }

    let db = Database::open(&db_path).expect("reopen failed");
    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_open_creates_missing_parent_directory() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db_path = tmp.path().join("nested").join("data").join("smartmarks.db");

    let db = Database::open(&db_path);

    assert!(db.is_ok(), "open should create the parent directory");
    assert!(db_path.exists());
}
