// Database access for the hospital database
pub mod adapter;
pub mod sqlite;

pub use adapter::DatabaseAdapter;
pub use sqlite::SqliteAdapter;
