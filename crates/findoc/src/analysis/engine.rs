//! Analysis engine: query + document text in, raw structured output out

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;

use super::pipeline::{AnalysisPipeline, StageContext};

/// Produces the raw analysis output for a job
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn analyze(&self, query: &str, document_text: &str) -> Result<String>;
}

/// Engine backed by an LLM provider and a stage pipeline
pub struct LlmAnalysisEngine {
    llm: Arc<dyn LlmProvider>,
    pipeline: AnalysisPipeline,
}

impl LlmAnalysisEngine {
    pub fn new(llm: Arc<dyn LlmProvider>, pipeline: AnalysisPipeline) -> Self {
        Self { llm, pipeline }
    }
}

#[async_trait]
impl AnalysisEngine for LlmAnalysisEngine {
    async fn analyze(&self, query: &str, document_text: &str) -> Result<String> {
        self.pipeline
            .run(self.llm.as_ref(), StageContext::new(query, document_text))
            .await
    }
}
