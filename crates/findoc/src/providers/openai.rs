//! OpenAI-compatible chat completions provider (Groq, OpenAI, vLLM)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::LlmProvider;
use super::retry::retry_request;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::engine("Completion response contained no message"))
    }
}

/// Chat completions client with bearer-token auth
pub struct OpenAiCompatLlm {
    client: Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl OpenAiCompatLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = config.api_key();
        if api_key.is_none() {
            tracing::warn!("{} is not set; requests will be unauthenticated", config.api_key_env);
        }

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .authorized(self.client.post(self.endpoint("chat/completions")))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::engine(format!("Completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::engine(format!(
                "Completion failed: HTTP {} - {}",
                status, body
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::engine(format!("Failed to parse completion response: {}", e)))?;

        completion.into_content()
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::info!("Generating analysis with model: {}", self.config.model);
        retry_request(self.config.max_retries, Duration::from_secs(1), || {
            self.generate_once(prompt)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        match self.authorized(self.client.get(self.endpoint("models"))).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_content().unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_empty_choices_is_engine_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(response.into_content(), Err(Error::Engine(_))));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = LlmConfig {
            base_url: "https://api.groq.com/openai/v1/".to_string(),
            ..LlmConfig::default()
        };
        let llm = OpenAiCompatLlm::new(&config).unwrap();
        assert_eq!(
            llm.endpoint("chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
