//! Local SQLite storage for bookmarks.
//!
//! ```no_run
//! use smartmarks::database::Database;
//!
//! let db = Database::open("data/smartmarks.db").expect("failed to open database");
//! let scratch = Database::open_in_memory().expect("failed to open in-memory database");
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
