//! Analysis engine: LLM stage pipeline producing structured investment analysis

pub mod engine;
pub mod pipeline;
pub mod prompt;

pub use engine::{AnalysisEngine, LlmAnalysisEngine};
pub use pipeline::{AnalysisPipeline, AnalysisStage, StageContext};
pub use prompt::PromptBuilder;
