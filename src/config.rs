use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    /// Most rows read from a generated query
    pub max_rows: u64,
    /// Reject anything but a single read-only statement, and apply `max_rows`
    pub validate_sql: bool,
    /// Sample rows shown per table in the schema prompt
    pub sample_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub top_k: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub api_url: String,
    pub lang: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // .env values only fill in what the real environment leaves unset
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from defaults plus whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder()
            .set_default("database.path", "Hospital.db")?
            .set_default("database.max_rows", 1000)?
            .set_default("database.validate_sql", true)?
            .set_default("database.sample_rows", 3)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("llm.api_url", "https://api.groq.com/openai/v1/chat/completions")?
            .set_default("llm.model", "llama-3.3-70b-versatile")?
            .set_default("llm.temperature", 0.0)?
            .set_default("llm.top_k", 5)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("speech.api_url", "https://translate.google.com/translate_tts")?
            .set_default("speech.lang", "en")?
            .set_default("logging.level", "info")?;

        if let Some(path) = lookup("DATABASE_PATH") {
            builder = builder.set_override("database.path", path)?;
        }

        if let Some(max_rows) = lookup("DATABASE_MAX_ROWS") {
            builder = builder.set_override("database.max_rows", max_rows.parse::<u64>().unwrap_or(1000))?;
        }

        if let Some(validate) = lookup("DATABASE_VALIDATE_SQL") {
            builder = builder.set_override("database.validate_sql", parse_flag(&validate, true))?;
        }

        if let Some(sample_rows) = lookup("DATABASE_SAMPLE_ROWS") {
            builder = builder.set_override("database.sample_rows", sample_rows.parse::<u64>().unwrap_or(3))?;
        }

        if let Some(host) = lookup("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Some(port) = lookup("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(3000))?;
        }

        if let Some(api_url) = lookup("LLM_API_URL") {
            builder = builder.set_override("llm.api_url", api_url)?;
        }

        // OPENAI_API_KEY wins when both are set
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .or_else(|| lookup("GROQ_API_KEY").filter(|key| !key.trim().is_empty()));
        if let Some(api_key) = api_key {
            builder = builder.set_override("llm.api_key", api_key)?;
        }

        if let Some(model) = lookup("LLM_MODEL") {
            builder = builder.set_override("llm.model", model)?;
        }

        if let Some(temperature) = lookup("LLM_TEMPERATURE") {
            builder = builder.set_override("llm.temperature", temperature.parse::<f64>().unwrap_or(0.0))?;
        }

        if let Some(top_k) = lookup("LLM_TOP_K") {
            builder = builder.set_override("llm.top_k", top_k.parse::<u32>().unwrap_or(5))?;
        }

        if let Some(timeout) = lookup("LLM_TIMEOUT_SECS") {
            builder = builder.set_override("llm.timeout_secs", timeout.parse::<u64>().unwrap_or(60))?;
        }

        if let Some(api_url) = lookup("TTS_API_URL") {
            builder = builder.set_override("speech.api_url", api_url)?;
        }

        if let Some(lang) = lookup("TTS_LANG") {
            builder = builder.set_override("speech.lang", lang)?;
        }

        if let Some(log_level) = lookup("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
