// Database accessor trait, the seam between the pipeline and the SQL engine
use crate::error::AppError;
use crate::models::{DatabaseMetadata, RawResult};

/// Database adapter trait - schema discovery and query execution
#[async_trait::async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Discover tables, columns and views
    async fn get_metadata(&self) -> Result<DatabaseMetadata, AppError>;

    /// Schema description handed to the translator: CREATE statements
    /// followed by a few sample rows per table
    async fn table_info(&self) -> Result<String, AppError>;

    /// Run a SQL statement and return what it produced
    async fn execute_query(&self, sql: &str) -> Result<RawResult, AppError>;
}
