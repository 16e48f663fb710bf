use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::{Parser, ParserError};
use crate::error::AppError;

/// SQL validation service for ensuring generated queries are read-only
///
/// sqlparser does not cover every SQLite construct (`GLOB`, `IS NOT <value>`),
/// so statements it cannot parse are passed on. SQLite's own read-only
/// check in the adapter is the final word for those.
pub struct SqlValidator;

impl SqlValidator {
    fn parse(sql: &str) -> Result<Vec<Statement>, ParserError> {
        let dialect = SQLiteDialect {};
        Parser::new(&dialect).try_with_sql(sql)?.parse_statements()
    }

    /// Reject anything sqlparser recognises as other than a single query
    pub fn validate_select_only(sql: &str) -> Result<(), AppError> {
        let ast = match Self::parse(sql) {
            Ok(ast) => ast,
            Err(e) => {
                tracing::debug!("sqlparser could not read generated SQL, deferring to SQLite: {}", e);
                return Ok(());
            }
        };

        if ast.is_empty() {
            return Err(AppError::InvalidSql("Empty SQL query".to_string()));
        }

        if ast.len() > 1 {
            return Err(AppError::InvalidSql(format!(
                "Expected a single statement, found {}.",
                ast.len()
            )));
        }

        match &ast[0] {
            Statement::Query(_) => Ok(()),
            Statement::Insert { .. } => {
                Err(AppError::InvalidSql("INSERT statements are not allowed.".to_string()))
            }
            Statement::Update { .. } => {
                Err(AppError::InvalidSql("UPDATE statements are not allowed.".to_string()))
            }
            Statement::Delete { .. } => {
                Err(AppError::InvalidSql("DELETE statements are not allowed.".to_string()))
            }
            Statement::Drop { .. } => {
                Err(AppError::InvalidSql("DROP statements are not allowed.".to_string()))
            }
            Statement::CreateTable { .. } => {
                Err(AppError::InvalidSql("CREATE TABLE statements are not allowed.".to_string()))
            }
            Statement::AlterTable { .. } => {
                Err(AppError::InvalidSql("ALTER TABLE statements are not allowed.".to_string()))
            }
            _ => Err(AppError::InvalidSql("Only SELECT queries are permitted.".to_string())),
        }
    }
}
