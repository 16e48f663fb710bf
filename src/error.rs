use thiserror::Error;

/// Application error types
///
/// The first six variants map one-to-one onto pipeline stages. The rest
/// belong to the clients and startup.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Translation error: {0}")]
    Translation(String),

    #[error("{0}")]
    Extraction(String),

    #[error("Database error: {0}")]
    Execution(String),

    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    #[error("Error formatting results: {0}")]
    Parse(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Error generating speech: {0}")]
    Synthesis(String),

    #[error("LLM service error: {0}")]
    LlmService(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable code shown next to the message on the page
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Translation(_) => "TRANSLATION_ERROR",
            AppError::Extraction(_) => "EXTRACTION_ERROR",
            AppError::Execution(_) => "EXECUTION_ERROR",
            AppError::InvalidSql(_) => "INVALID_SQL",
            AppError::Parse(_) => "PARSE_ERROR",
            AppError::Summarization(_) => "SUMMARIZATION_ERROR",
            AppError::Synthesis(_) => "SYNTHESIS_ERROR",
            AppError::LlmService(_) => "LLM_SERVICE_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message rendered to the user, with a hint for the common failures
    pub fn user_message(&self) -> String {
        let msg = self.to_string();
        match self {
            AppError::Execution(detail) if detail.contains("no such table") || detail.contains("no such column") => {
                format!("{} The generated SQL refers to something that is not in the database; try rephrasing the question.", msg)
            }
            AppError::InvalidSql(_) => {
                format!("{} Only SELECT queries are allowed.", msg)
            }
            AppError::Translation(detail) if detail.contains("API key") => {
                format!("{} Set OPENAI_API_KEY (or GROQ_API_KEY) and restart.", msg)
            }
            _ => msg,
        }
    }

    /// Degraded stages still produce a response; everything else ends the request
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            AppError::Parse(_) | AppError::Summarization(_) | AppError::Synthesis(_)
        )
    }
}

/// Convert rusqlite::Error to AppError
impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}
