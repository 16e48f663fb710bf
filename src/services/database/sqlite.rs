// SQLite adapter over the hospital database file, opened read-only
use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{Column, DatabaseMetadata, RawResult, ResultSet, Table, View};
use crate::services::database::adapter::DatabaseAdapter;
use crate::validation::SqlValidator;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row, Statement};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Uses tokio::Mutex for async-friendly locking
pub struct SqliteAdapter {
    conn: Arc<Mutex<Connection>>,
    path: String,
    max_rows: u64,
    validate_sql: bool,
    sample_rows: usize,
}

impl SqliteAdapter {
    /// Open an existing database file; a missing file is an error rather
    /// than an empty new database
    pub fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        // Accept sqlite:path and sqlite:///path as well as bare paths
        let clean_path = config
            .path
            .strip_prefix("sqlite:")
            .map(|p| p.trim_start_matches("//"))
            .unwrap_or(&config.path)
            .to_string();

        if !Path::new(&clean_path).exists() {
            return Err(AppError::Database(format!(
                "Database file {} does not exist",
                clean_path
            )));
        }

        let conn = Connection::open_with_flags(
            &clean_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        tracing::info!("Opened SQLite database {} (read-only)", clean_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: clean_path,
            max_rows: config.max_rows,
            validate_sql: config.validate_sql,
            sample_rows: config.sample_rows,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn load_metadata(conn: &Connection) -> Result<DatabaseMetadata, rusqlite::Error> {
        let mut stmt = conn.prepare(
            "SELECT type, name, sql FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = Vec::new();
        let mut views = Vec::new();
        for (kind, name, sql) in entries {
            if kind == "view" {
                views.push(View { name });
                continue;
            }
            let columns = Self::load_columns(conn, &name)?;
            tables.push(Table {
                name,
                columns,
                create_sql: sql,
            });
        }

        Ok(DatabaseMetadata::new(tables, views))
    }

    fn load_columns(conn: &Connection, table: &str) -> Result<Vec<Column>, rusqlite::Error> {
        let mut fk_stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", quote_identifier(table)))?;
        let foreign_keys = fk_stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
        let columns = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let references = foreign_keys
                    .iter()
                    .find(|(from, _, _)| *from == name)
                    .map(|(_, target, to)| match to {
                        Some(to) => format!("{}({})", target, to),
                        None => target.clone(),
                    });
                Ok(Column {
                    name,
                    data_type: row.get(2)?,
                    is_nullable: row.get::<_, i64>(3)? == 0,
                    is_primary_key: row.get::<_, i64>(5)? > 0,
                    references,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(columns)
    }

    fn sample_rows(conn: &Connection, table: &str, limit: usize) -> Result<ResultSet, rusqlite::Error> {
        let sql = format!("SELECT * FROM {} LIMIT {}", quote_identifier(table), limit);
        let mut stmt = conn.prepare(&sql)?;
        Ok(Self::collect_rows(&mut stmt, None)?.0)
    }

    /// Read rows until the statement is exhausted or `row_cap` is reached;
    /// the flag reports whether rows were left unread
    fn collect_rows(stmt: &mut Statement<'_>, row_cap: Option<u64>) -> Result<(ResultSet, bool), rusqlite::Error> {
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query([])?;
        let mut values = Vec::new();
        let mut truncated = false;
        while let Some(row) = rows.next()? {
            if row_cap.is_some_and(|cap| values.len() as u64 >= cap) {
                truncated = true;
                break;
            }
            values.push(row_values(row, width)?);
        }

        Ok((ResultSet::new(columns, values), truncated))
    }
}

#[async_trait::async_trait]
impl DatabaseAdapter for SqliteAdapter {
    async fn get_metadata(&self) -> Result<DatabaseMetadata, AppError> {
        let conn = self.conn.lock().await;
        Ok(Self::load_metadata(&conn)?)
    }

    async fn table_info(&self) -> Result<String, AppError> {
        let conn = self.conn.lock().await;
        let metadata = Self::load_metadata(&conn)?;

        let mut sections = Vec::new();
        for table in &metadata.tables {
            let mut section = table.definition();
            if self.sample_rows > 0 {
                let sample = Self::sample_rows(&conn, &table.name, self.sample_rows)?;
                section.push_str(&format!(
                    "\n\n/*\n{} rows from {} table:\n{}\n",
                    self.sample_rows,
                    table.name,
                    sample.columns.join("\t")
                ));
                for row in &sample.rows {
                    let cells: Vec<String> = row.iter().map(crate::models::display_value).collect();
                    section.push_str(&cells.join("\t"));
                    section.push('\n');
                }
                section.push_str("*/");
            }
            sections.push(section);
        }

        Ok(sections.join("\n\n"))
    }

    async fn execute_query(&self, sql: &str) -> Result<RawResult, AppError> {
        let sql = sql.trim();
        if self.validate_sql {
            SqlValidator::validate_select_only(sql)?;
        }

        let start_time = Instant::now();
        let conn = self.conn.lock().await;
        let execution_error = |e: rusqlite::Error| {
            tracing::error!("Query execution error: {}. SQL: {}", e, sql);
            AppError::Execution(e.to_string())
        };

        let mut stmt = conn.prepare(sql).map_err(execution_error)?;
        if self.validate_sql && !stmt.readonly() {
            return Err(AppError::InvalidSql("Only SELECT queries are permitted.".to_string()));
        }

        let row_cap = self.validate_sql.then_some(self.max_rows);
        let (result, truncated) = Self::collect_rows(&mut stmt, row_cap).map_err(execution_error)?;
        if truncated {
            tracing::warn!("Query result capped at {} rows", self.max_rows);
        }

        tracing::info!(
            "Query returned {} rows in {} ms",
            result.row_count(),
            start_time.elapsed().as_millis()
        );

        Ok(RawResult::Rows(result))
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn row_values(row: &Row<'_>, width: usize) -> Result<Vec<Value>, rusqlite::Error> {
    let mut values = Vec::with_capacity(width);
    for idx in 0..width {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => json!(v),
            // JSON has no infinities or NaN
            ValueRef::Real(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(v.to_string())),
            ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => json!(format!("<blob {} bytes>", bytes.len())),
        };
        values.push(value);
    }
    Ok(values)
}
