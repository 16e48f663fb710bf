use crate::error::AppError;
use crate::models::ResultSet;
use crate::services::llm_service::LanguageModel;
use std::sync::Arc;

/// Describes query results in plain language
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, question: &str, results: &ResultSet) -> Result<String, AppError>;
}

pub struct LlmSummarizer {
    llm: Arc<dyn LanguageModel>,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub fn build_prompt(question: &str, results: &ResultSet) -> String {
        format!(
            "Based on the query \"{}\" and the results {},\nprovide a brief, clear summary of the findings in natural language.",
            question,
            results.to_literal()
        )
    }
}

#[async_trait::async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, question: &str, results: &ResultSet) -> Result<String, AppError> {
        let prompt = Self::build_prompt(question, results);
        self.llm
            .complete(&prompt, &[])
            .await
            .map_err(|e| AppError::Summarization(e.to_string()))
    }
}
