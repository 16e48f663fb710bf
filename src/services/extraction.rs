use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;
use crate::models::ExtractedSql;

// Dot matches newline: everything after the marker, to the end
static SQL_QUERY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)SQLQuery: (.*)").expect("static pattern compiles")
});

pub const EXTRACTION_FAILED: &str = "Could not extract SQL query from response";

/// Pull the SQL statement out of translator output
pub fn extract(translation: &str) -> Result<ExtractedSql, AppError> {
    let captured = SQL_QUERY_PATTERN
        .captures(translation)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| AppError::Extraction(EXTRACTION_FAILED.to_string()))?;

    Ok(ExtractedSql(strip_code_fence(captured.as_str().trim()).to_string()))
}

/// Keep only the body of a markdown fence opening the statement; anything
/// after the closing fence is prose
fn strip_code_fence(sql: &str) -> &str {
    let Some(rest) = sql.strip_prefix("```") else {
        return sql;
    };
    let body = rest
        .strip_prefix("sqlite")
        .or_else(|| rest.strip_prefix("sql"))
        .unwrap_or(rest);
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
