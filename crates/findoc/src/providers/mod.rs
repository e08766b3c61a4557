//! LLM provider abstractions
//!
//! Trait-based so the analysis engine can run against a hosted
//! OpenAI-compatible API or a local Ollama server.

pub mod llm;
pub mod ollama;
pub mod openai;
mod retry;

use std::sync::Arc;

use crate::config::{LlmBackend, LlmConfig};
use crate::error::Result;

pub use llm::LlmProvider;
pub use ollama::OllamaLlm;
pub use openai::OpenAiCompatLlm;

/// Build the configured provider
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        LlmBackend::OpenAi => Arc::new(OpenAiCompatLlm::new(config)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(config)?),
    };
    tracing::info!("LLM provider: {} ({})", provider.name(), provider.model());
    Ok(provider)
}
