//! LLM provider trait

use async_trait::async_trait;
use crate::error::Result;

/// Trait for raw text generation
///
/// Implementations:
/// - `OpenAiCompatLlm`: OpenAI-compatible chat completions (Groq, OpenAI)
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
