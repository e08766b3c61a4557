//! Ollama-based LLM provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::LlmProvider;
use super::retry::retry_request;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama LLM provider using `/api/generate` in JSON mode
pub struct OllamaLlm {
    client: Client,
    config: LlmConfig,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::engine(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::engine(format!(
                "Generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::engine(format!("Failed to parse generation response: {}", e)))?;

        Ok(generated.response)
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::info!("Generating analysis with Ollama model: {}", self.config.model);
        retry_request(self.config.max_retries, Duration::from_secs(1), || {
            self.generate_once(prompt)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_asks_for_json() {
        let request = GenerateRequest {
            model: "llama3.2:3b",
            prompt: "analyze",
            stream: false,
            format: "json",
            options: GenerateOptions { temperature: 0.2 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_provider_identity() {
        let config = LlmConfig {
            model: "llama3.2:3b".to_string(),
            ..LlmConfig::default()
        };
        let llm = OllamaLlm::new(&config).unwrap();
        assert_eq!(llm.name(), "ollama");
        assert_eq!(llm.model(), "llama3.2:3b");
    }
}
