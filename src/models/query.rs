use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::result::ResultSet;
use crate::error::AppError;

/// Model output for a question: explanatory text with the SQL embedded
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub text: String,
}

impl TranslationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// SQL isolated from a translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSql(pub String);

impl ExtractedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Synthesized speech, small enough to inline as a data URL
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioPayload {
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "audio/mpeg".to_string(),
            bytes,
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Idle,
    Translating,
    Extracting,
    Executing,
    Parsing,
    Summarizing,
    Synthesizing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Translating => "translating",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Executing => "executing",
            PipelineStage::Parsing => "parsing",
            PipelineStage::Summarizing => "summarizing",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the results section of the page shows
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    /// Execution never produced anything
    NotRun,
    /// Zero rows
    Empty,
    Table(ResultSet),
    /// Output that could not be parsed, shown verbatim
    Unparsed(String),
}

/// One question/answer cycle
#[derive(Debug)]
pub struct QueryRun {
    pub id: String,
    pub question: String,
    pub stage: PipelineStage,
    /// Full translator output, shown under "View Generated SQL"
    pub generated_text: Option<String>,
    pub sql: Option<String>,
    pub results: ResultView,
    pub row_count: Option<usize>,
    pub execution_time_ms: Option<u64>,
    pub summary: Option<String>,
    pub audio: Option<AudioPayload>,
    /// The error that ended the request, if any
    pub error: Option<AppError>,
    /// Errors from stages that degrade instead of failing
    pub notices: Vec<AppError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl QueryRun {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question: question.into(),
            stage: PipelineStage::Idle,
            generated_text: None,
            sql: None,
            results: ResultView::NotRun,
            row_count: None,
            execution_time_ms: None,
            summary: None,
            audio: None,
            error: None,
            notices: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn advance(&mut self, stage: PipelineStage) {
        tracing::info!(run_id = %self.id, from = %self.stage, to = %stage, "pipeline stage");
        self.stage = stage;
    }

    pub fn mark_results(&mut self, results: ResultSet) {
        self.row_count = Some(results.row_count());
        self.results = if results.is_empty() {
            ResultView::Empty
        } else {
            ResultView::Table(results)
        };
    }

    pub fn add_notice(&mut self, notice: AppError) {
        debug_assert!(notice.is_degraded(), "fatal error recorded as notice: {}", notice);
        tracing::warn!(run_id = %self.id, stage = %self.stage, "{}", notice);
        self.notices.push(notice);
    }

    pub fn mark_done(&mut self) {
        self.advance(PipelineStage::Done);
        self.finish();
    }

    pub fn mark_failed(&mut self, error: AppError) {
        tracing::error!(run_id = %self.id, stage = %self.stage, "{}", error);
        self.stage = PipelineStage::Failed;
        self.error = Some(error);
        self.finish();
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        tracing::info!(run_id = %self.id, elapsed_ms = self.elapsed_ms(), "run finished");
    }

    /// Wall-clock time of the whole run, once it has finished
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished_at| (finished_at - self.started_at).num_milliseconds())
    }

    pub fn is_degraded(&self) -> bool {
        self.stage == PipelineStage::Done && !self.notices.is_empty()
    }
}
