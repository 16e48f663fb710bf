use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Rows returned by a query, with their column names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Rows without names get positional headers `0`, `1`, ...
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = (0..width).map(|i| i.to_string()).collect();
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a literal sequence of tuples, e.g. `[(1, 'Alice'), (2, None)]`
    pub fn to_literal(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(literal_value).collect();
                if values.len() == 1 {
                    format!("({},)", values[0])
                } else {
                    format!("({})", values.join(", "))
                }
            })
            .collect();
        format!("[{}]", rows.join(", "))
    }
}

/// Plain-text rendering of one cell for tables
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn literal_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('\'', "\\'")
                .replace('\n', "\\n");
            format!("'{}'", escaped)
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(literal_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(_) => value.to_string(),
    }
}

/// What an executor hands back: structured rows, or a serialized
/// sequence from executors that only speak text
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Rows(ResultSet),
    Text(String),
}

impl fmt::Display for RawResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawResult::Rows(set) => write!(f, "{}", set.to_literal()),
            RawResult::Text(text) => write!(f, "{}", text),
        }
    }
}
