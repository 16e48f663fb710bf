//! Turns executor output into rows.
//!
//! Structured rows pass straight through. Text is read as a literal
//! sequence of rows, either JSON (`[[1, "a"]]`) or tuple notation
//! (`[(1, 'a'), (2, None)]`).

use serde_json::{Number, Value};

use crate::error::AppError;
use crate::models::{RawResult, ResultSet};

pub fn parse(raw: &RawResult) -> Result<ResultSet, AppError> {
    match raw {
        RawResult::Rows(set) => Ok(set.clone()),
        RawResult::Text(text) => parse_text(text),
    }
}

fn parse_text(text: &str) -> Result<ResultSet, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(ResultSet::from_rows(Vec::new()));
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(_) => LiteralParser::new(trimmed).parse_document()?,
    };

    let items = match value {
        Value::Array(items) => items,
        _ => return Err(AppError::Parse("result is not a sequence".to_string())),
    };

    let mut rows = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Array(row) => rows.push(row),
            other => {
                return Err(AppError::Parse(format!(
                    "row {} is not a tuple or list: {}",
                    idx, other
                )))
            }
        }
    }

    Ok(ResultSet::from_rows(rows))
}

/// Nesting limit, matching serde_json's recursion limit
const MAX_DEPTH: usize = 128;

/// Recursive-descent reader for tuple-notation literals
struct LiteralParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0, depth: 0 }
    }

    fn parse_document(&mut self) -> Result<Value, AppError> {
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error("unexpected trailing characters"));
        }
        Ok(value)
    }

    fn error(&self, message: &str) -> AppError {
        AppError::Parse(format!("{} at offset {}", message, self.pos))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse_value(&mut self) -> Result<Value, AppError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.parse_sequence('[', ']'),
            Some('(') => self.parse_sequence('(', ')'),
            Some('\'') | Some('"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() => self.parse_keyword(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Result<Value, AppError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = self.parse_items(open, close);
        self.depth -= 1;
        result
    }

    fn parse_items(&mut self, open: char, close: char) -> Result<Value, AppError> {
        debug_assert_eq!(self.peek(), Some(open));
        self.bump();

        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Value::Array(items)),
                Some(_) => return Err(self.error("expected ',' or closing bracket")),
                None => return Err(self.error("unterminated sequence")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, AppError> {
        let quote = self.bump().ok_or_else(|| self.error("expected quote"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' => out.push(escaped),
                        'x' => out.push(self.parse_hex_escape(2)?),
                        'u' => out.push(self.parse_hex_escape(4)?),
                        'U' => out.push(self.parse_hex_escape(8)?),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_hex_escape(&mut self, digits: usize) -> Result<char, AppError> {
        let end = self.pos + digits;
        let hex = self
            .input
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }

    fn parse_number(&mut self) -> Result<Value, AppError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_')) {
            self.bump();
        }
        let literal: String = self.input[start..self.pos].chars().filter(|c| *c != '_').collect();

        if !literal.contains(['.', 'e', 'E']) {
            if let Ok(v) = literal.parse::<i64>() {
                return Ok(Value::Number(v.into()));
            }
            if let Ok(v) = literal.trim_start_matches('+').parse::<u64>() {
                return Ok(Value::Number(v.into()));
            }
            return Err(AppError::Parse(format!(
                "integer '{}' at offset {} is invalid or out of range",
                literal, start
            )));
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| AppError::Parse(format!("invalid number '{}' at offset {}", literal, start)))
    }

    fn parse_keyword(&mut self) -> Result<Value, AppError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.input[start..self.pos] {
            "None" => Ok(Value::Null),
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            other => Err(AppError::Parse(format!("unknown literal '{}' at offset {}", other, start))),
        }
    }
}
