use crate::config::LlmConfig;
use crate::error::AppError;
use reqwest::Client as HttpClient;
use serde_json::json;
use std::time::Duration;

/// Anything that turns a prompt into a completion
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the completion text. Generation halts at
    /// the first of `stop`.
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, AppError>;
}

/// Client for an OpenAI-compatible chat completions endpoint
pub struct LlmService {
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    http_client: HttpClient,
}

impl LlmService {
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait::async_trait]
impl LanguageModel for LlmService {
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, AppError> {
        // A missing key fails the request, not the process
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            AppError::LlmService("API key not configured".to_string())
        })?;

        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });
        if !stop.is_empty() {
            body["stop"] = json!(stop);
        }

        tracing::debug!("Calling {} with model {}", self.api_url, self.model);

        let response = self
            .http_client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmService(format!("Failed to call LLM service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            let truncated: String = error_text.chars().take(300).collect();
            return Err(AppError::LlmService(format!(
                "LLM service returned error {}: {}",
                status, truncated
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LlmService(format!("Failed to parse LLM response: {}", e)))?;

        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AppError::LlmService("LLM response does not contain any content".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}
