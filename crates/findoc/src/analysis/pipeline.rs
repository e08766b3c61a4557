//! Ordered analysis stages
//!
//! A stage turns the accumulated context into a prompt; the pipeline sends
//! each prompt to the LLM in order and threads outputs forward. The final
//! stage's raw output is the pipeline result.

use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::prompt::PromptBuilder;

/// Inputs visible to a stage
#[derive(Debug, Clone)]
pub struct StageContext {
    pub query: String,
    pub document_text: String,
    /// `(stage name, raw output)` of stages already run
    pub prior: Vec<(String, String)>,
}

impl StageContext {
    pub fn new(query: impl Into<String>, document_text: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            document_text: document_text.into(),
            prior: Vec::new(),
        }
    }
}

/// A named prompt builder
#[derive(Clone)]
pub struct AnalysisStage {
    pub name: &'static str,
    pub build_prompt: fn(&StageContext) -> String,
}

impl std::fmt::Debug for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisStage").field("name", &self.name).finish()
    }
}

/// Sequential stage runner
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    stages: Vec<AnalysisStage>,
}

impl AnalysisPipeline {
    pub fn new(stages: Vec<AnalysisStage>) -> Self {
        Self { stages }
    }

    /// The active pipeline: a single financial analysis stage
    pub fn financial() -> Self {
        Self::new(vec![AnalysisStage {
            name: "financial_analysis",
            build_prompt: PromptBuilder::financial_analysis,
        }])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }

    /// Run every stage in order and return the last stage's output
    pub async fn run(&self, llm: &dyn LlmProvider, mut ctx: StageContext) -> Result<String> {
        let mut last = None;

        for stage in &self.stages {
            let prompt = (stage.build_prompt)(&ctx);
            tracing::debug!("Running stage '{}' ({} prompt chars)", stage.name, prompt.len());

            let output = llm.generate(&prompt).await.map_err(|e| match e {
                Error::Engine(msg) => Error::engine(format!("stage '{}': {}", stage.name, msg)),
                other => other,
            })?;

            ctx.prior.push((stage.name.to_string(), output.clone()));
            last = Some(output);
        }

        last.ok_or_else(|| Error::engine("Analysis pipeline has no stages"))
    }
}
