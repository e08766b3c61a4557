//! Structured investment analysis produced by the analysis engine

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Overall risk classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Investment recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvestmentRecommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

/// A single metric pulled from the document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialMetric {
    pub metric: String,
    pub value: Option<String>,
    pub trend: Option<String>,
}

/// Result schema every completed job carries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub executive_summary: String,
    pub key_financial_metrics: Vec<FinancialMetric>,
    pub risk_level: RiskLevel,
    pub risk_explanation: String,
    pub investment_recommendation: InvestmentRecommendation,
    pub confidence_score: i64,
}

impl AnalysisResult {
    /// Parse raw engine output
    ///
    /// The output must be a bare JSON document; surrounding prose, comments or
    /// a missing field all fail.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw.trim()).map_err(|e| Error::parse(e.to_string()))
    }

    /// Canonical JSON stored on the job record
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "executive_summary": "Revenue grew while margins compressed.",
        "key_financial_metrics": [
            {"metric": "Revenue", "value": "$25.2B", "trend": "up"},
            {"metric": "Free cash flow", "value": null, "trend": null}
        ],
        "risk_level": "Medium",
        "risk_explanation": "Margin pressure and capex commitments.",
        "investment_recommendation": "Strong Buy",
        "confidence_score": 72
    }"#;

    #[test]
    fn test_parse_valid_output() {
        let result = AnalysisResult::parse(SAMPLE).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.investment_recommendation, InvestmentRecommendation::StrongBuy);
        assert_eq!(result.key_financial_metrics.len(), 2);
        assert_eq!(result.key_financial_metrics[1].value, None);
        assert_eq!(result.confidence_score, 72);
    }

    #[test]
    fn test_reserialized_json_keeps_schema_names() {
        let result = AnalysisResult::parse(SAMPLE).unwrap();
        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(value["investment_recommendation"], "Strong Buy");
        assert_eq!(value["risk_level"], "Medium");
        for field in [
            "executive_summary",
            "key_financial_metrics",
            "risk_level",
            "risk_explanation",
            "investment_recommendation",
            "confidence_score",
        ] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(matches!(AnalysisResult::parse("not json"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_rejects_commented_json() {
        let raw = SAMPLE.replace("\"confidence_score\": 72", "\"confidence_score\": 72 // fairly sure");
        assert!(AnalysisResult::parse(&raw).is_err());
    }

    #[test]
    fn test_rejects_out_of_schema_enum() {
        let raw = SAMPLE.replace("\"Strong Buy\"", "\"Strong Sell\"");
        assert!(AnalysisResult::parse(&raw).is_err());
    }

    #[test]
    fn test_rejects_missing_field() {
        let raw = r#"{"executive_summary": "x", "risk_level": "Low"}"#;
        assert!(AnalysisResult::parse(raw).is_err());
    }
}
