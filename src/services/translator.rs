use crate::error::AppError;
use crate::models::TranslationResult;
use crate::services::llm_service::LanguageModel;
use std::sync::Arc;

/// Marker the model is asked to put in front of the SQL
pub const SQL_MARKER: &str = "SQLQuery:";

/// The model stops before it makes up a result for its own query
const STOP_SEQUENCE: &str = "\nSQLResult:";

/// Turns a question into model text that should contain an `SQLQuery:` line
#[async_trait::async_trait]
pub trait SqlTranslator: Send + Sync {
    async fn translate(&self, question: &str, schema: &str) -> Result<TranslationResult, AppError>;
}

/// Translator backed by a language model and a SQLite-flavoured prompt
pub struct LlmSqlTranslator {
    llm: Arc<dyn LanguageModel>,
    top_k: u32,
}

impl LlmSqlTranslator {
    pub fn new(llm: Arc<dyn LanguageModel>, top_k: u32) -> Self {
        Self { llm, top_k }
    }

    pub fn build_prompt(&self, question: &str, schema: &str) -> String {
        format!(
            r#"You are a SQLite expert. Given an input question, first create a syntactically correct SQLite query to run, then look at the results of the query and return the answer to the input question.
Unless the user specifies in the question a specific number of examples to obtain, query for at most {top_k} results using the LIMIT clause as per SQLite. You can order the results to return the most informative data in the database.
Never query for all columns from a table. You must query only the columns that are needed to answer the question. Wrap each column name in double quotes (") to denote them as delimited identifiers.
Pay attention to use only the column names you can see in the tables below. Be careful to not query for columns that do not exist. Also, pay attention to which column is in which table.
Pay attention to use date('now') function to get the current date, if the question involves "today".

Use the following format:

Question: Question here
{marker} SQL Query to run
SQLResult: Result of the SQLQuery
Answer: Final answer here

Only use the following tables:
{schema}

Question: {question}"#,
            top_k = self.top_k,
            marker = SQL_MARKER,
            schema = schema,
            question = question,
        )
    }
}

#[async_trait::async_trait]
impl SqlTranslator for LlmSqlTranslator {
    async fn translate(&self, question: &str, schema: &str) -> Result<TranslationResult, AppError> {
        let prompt = self.build_prompt(question, schema);

        tracing::info!("Generating SQL from natural language question: {}", question);
        let text = self
            .llm
            .complete(&prompt, &[STOP_SEQUENCE])
            .await
            .map_err(|e| AppError::Translation(e.to_string()))?;

        tracing::debug!("Translator output: {}", text);
        Ok(TranslationResult::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::MockLanguageModel;

    #[test]
    fn test_prompt_contents() {
        let translator = LlmSqlTranslator::new(Arc::new(MockLanguageModel::replying("")), 5);
        let prompt = translator.build_prompt(
            "Which doctors treat flu?",
            "CREATE TABLE doctors (id INTEGER, name TEXT)",
        );

        assert!(prompt.contains("at most 5 results"));
        assert!(prompt.contains("SQLQuery: SQL Query to run"));
        assert!(prompt.contains("CREATE TABLE doctors (id INTEGER, name TEXT)"));
        assert!(prompt.ends_with("Question: Which doctors treat flu?"));
    }

    #[tokio::test]
    async fn test_translate_passes_stop_sequence() {
        let llm = Arc::new(MockLanguageModel::replying(
            "Question: Show me all patients over 40\nSQLQuery: SELECT * FROM patients WHERE age > 40",
        ));
        let translator = LlmSqlTranslator::new(llm.clone(), 5);

        let result = translator.translate("Show me all patients over 40", "schema").await.unwrap();
        assert!(result.text.contains("SQLQuery: SELECT * FROM patients WHERE age > 40"));
        assert_eq!(llm.call_count(), 1);
        assert_eq!(llm.last_stop(), vec![STOP_SEQUENCE.to_string()]);
    }

    #[tokio::test]
    async fn test_translate_maps_model_failure() {
        let translator = LlmSqlTranslator::new(Arc::new(MockLanguageModel::failing("connection refused")), 5);
        let err = translator.translate("q", "schema").await.unwrap_err();
        assert!(matches!(err, AppError::Translation(msg) if msg.contains("connection refused")));
    }
}
