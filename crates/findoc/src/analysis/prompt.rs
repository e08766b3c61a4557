//! Prompt templates for the analysis stages

use super::pipeline::StageContext;

/// JSON shape the financial analysis stage must return
pub const RESULT_SCHEMA: &str = r#"{
  "executive_summary": string,
  "key_financial_metrics": [
    { "metric": string, "value": string | null, "trend": string | null }
  ],
  "risk_level": "Low" | "Medium" | "High",
  "risk_explanation": string,
  "investment_recommendation": "Strong Buy" | "Buy" | "Hold" | "Sell",
  "confidence_score": integer
}"#;

/// Prompt builder for analysis stages
pub struct PromptBuilder;

impl PromptBuilder {
    /// Financial analysis prompt: document text, user query, strict JSON output
    pub fn financial_analysis(ctx: &StageContext) -> String {
        format!(
            r#"You are a senior financial analyst. Base every statement strictly on the document below and never invent figures.

DOCUMENT:
{document}

Answer the user's query: {query}
Extract key financial metrics including revenue trends, net income trends, debt levels, and cash flow indicators.
{prior}
Return output strictly in valid JSON with this structure:
{schema}

Rules:
- If a metric is not explicitly mentioned, use null.
- Do NOT use comments.
- Do NOT use parentheses.
- Output must be valid JSON only."#,
            document = ctx.document_text,
            query = ctx.query,
            prior = Self::format_prior(ctx),
            schema = RESULT_SCHEMA,
        )
    }

    /// Earlier stage outputs, if any, as extra context
    fn format_prior(ctx: &StageContext) -> String {
        if ctx.prior.is_empty() {
            return String::new();
        }

        let mut out = String::from("\nFINDINGS FROM EARLIER REVIEW:\n");
        for (stage, output) in &ctx.prior {
            out.push_str(&format!("[{}]\n{}\n", stage, output));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_query_document_and_schema() {
        let ctx = StageContext::new("Summarize risk", "Revenue rose 12%.");
        let prompt = PromptBuilder::financial_analysis(&ctx);

        assert!(prompt.contains("Summarize risk"));
        assert!(prompt.contains("Revenue rose 12%."));
        assert!(prompt.contains("\"confidence_score\": integer"));
        assert!(!prompt.contains("FINDINGS FROM EARLIER REVIEW"));
    }

    #[test]
    fn test_prompt_includes_prior_findings() {
        let mut ctx = StageContext::new("q", "doc");
        ctx.prior.push(("verification".to_string(), "{\"ok\":true}".to_string()));
        let prompt = PromptBuilder::financial_analysis(&ctx);

        assert!(prompt.contains("[verification]"));
    }
}
