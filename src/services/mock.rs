/*!
 * Mock collaborators for pipeline tests.
 *
 * Each mock counts its calls so tests can assert that a stage was, or was
 * not, reached.
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::AppError;
use crate::models::{AudioPayload, DatabaseMetadata, RawResult, TranslationResult};
use crate::models::ResultSet;
use crate::services::database::DatabaseAdapter;
use crate::services::llm_service::LanguageModel;
use crate::services::speech::SpeechSynthesizer;
use crate::services::summarizer::Summarizer;
use crate::services::translator::SqlTranslator;

/// Language model returning a fixed reply or a fixed error
#[derive(Debug)]
pub struct MockLanguageModel {
    reply: Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<String>,
    last_stop: Mutex<Vec<String>>,
}

impl MockLanguageModel {
    fn new(reply: Result<String, String>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(String::new()),
            last_stop: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(Ok(reply.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Err(message.to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone()
    }

    pub fn last_stop(&self) -> Vec<String> {
        self.last_stop.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = prompt.to_string();
        *self.last_stop.lock().unwrap() = stop.iter().map(|s| s.to_string()).collect();
        self.reply.clone().map_err(AppError::LlmService)
    }
}

/// Translator returning canned text
#[derive(Debug)]
pub struct MockTranslator {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn replying(text: &str) -> Self {
        Self { reply: Ok(text.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn failing(message: &str) -> Self {
        Self { reply: Err(message.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlTranslator for MockTranslator {
    async fn translate(&self, _question: &str, _schema: &str) -> Result<TranslationResult, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map(TranslationResult::new)
            .map_err(AppError::Translation)
    }
}

/// Database returning a canned result for every query
#[derive(Debug)]
pub struct MockDatabase {
    result: Result<RawResult, String>,
    schema: Result<String, String>,
    calls: AtomicUsize,
    executed: Mutex<Vec<String>>,
}

impl MockDatabase {
    pub fn returning(result: RawResult) -> Self {
        Self {
            result: Ok(result),
            schema: Ok("CREATE TABLE patients (id INTEGER, name TEXT, age INTEGER)".to_string()),
            calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn rows(result: ResultSet) -> Self {
        Self::returning(RawResult::Rows(result))
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            ..Self::returning(RawResult::Text(String::new()))
        }
    }

    pub fn without_schema(mut self, message: &str) -> Self {
        self.schema = Err(message.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseAdapter for MockDatabase {
    async fn get_metadata(&self) -> Result<DatabaseMetadata, AppError> {
        Ok(DatabaseMetadata::new(Vec::new(), Vec::new()))
    }

    async fn table_info(&self) -> Result<String, AppError> {
        self.schema.clone().map_err(AppError::Database)
    }

    async fn execute_query(&self, sql: &str) -> Result<RawResult, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().unwrap().push(sql.to_string());
        self.result.clone().map_err(AppError::Execution)
    }
}

/// Summarizer returning canned text
#[derive(Debug)]
pub struct MockSummarizer {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockSummarizer {
    pub fn replying(text: &str) -> Self {
        Self { reply: Ok(text.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn failing(message: &str) -> Self {
        Self { reply: Err(message.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, _question: &str, _results: &ResultSet) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(AppError::Summarization)
    }
}

/// Synthesizer returning a few fixed bytes
#[derive(Debug)]
pub struct MockSynthesizer {
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockSynthesizer {
    pub fn working() -> Self {
        Self { fail_with: None, calls: AtomicUsize::new(0) }
    }

    pub fn failing(message: &str) -> Self {
        Self { fail_with: Some(message.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn speak(&self, _text: &str) -> Result<AudioPayload, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(AppError::Synthesis(message.clone())),
            None => Ok(AudioPayload::mp3(vec![0xff, 0xfb, 0x90])),
        }
    }
}
