// SPDX-License-Identifier: MIT

//! Value types shared between the research state, the nodes and the
//! collaborators.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Verdict returned by the question validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationVerdict {
    /// Whether the question is well-formed and answerable by web research
    pub valid: bool,
    /// Short explanation of the verdict
    pub reason: String,
    /// A better phrasing when the question was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Search strategy produced by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Search queries, executed in order
    pub queries: Vec<String>,
    /// Why these queries cover the question
    pub reasoning: String,
}

/// A single search hit, normalized across providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    /// Provider relevance, higher is better
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_suggestion_optional() {
        let verdict: ValidationVerdict =
            serde_json::from_str(r#"{"valid": false, "reason": "gibberish"}"#).unwrap();
        assert!(!verdict.valid);
        assert!(verdict.suggestion.is_none());

        let json = serde_json::to_value(&verdict).unwrap();
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn test_plan_requires_queries() {
        let parsed = serde_json::from_str::<Plan>(r#"{"reasoning": "none"}"#);
        assert!(parsed.is_err());
    }
}
