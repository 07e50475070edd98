// SPDX-License-Identifier: MIT

//! Brave web search API backend

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;

use super::{SearchOptions, SearchProvider};
use crate::adk::error::SearchError;
use crate::research::types::SearchResult;

const BRAVE_MAX_COUNT: u32 = 20;

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

pub struct BraveSearch {
    client: Client,
    api_key: String,
}

impl BraveSearch {
    pub fn new() -> Result<Self, SearchError> {
        let api_key = env::var("BRAVE_API_KEY")
            .map_err(|_| SearchError::ApiKeyMissing("BRAVE_API_KEY".to_string()))?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Brave has no relevance score; rank order is turned into one so the
    /// first hit scores 1.0 and later hits decrease linearly.
    fn parse_response(body: &Value) -> Result<Vec<SearchResult>, SearchError> {
        let Some(results_json) = body.get("web").and_then(|w| w.get("results")) else {
            // No web section means no hits for this query
            return Ok(Vec::new());
        };

        let results: Vec<BraveResult> = serde_json::from_value(results_json.clone())
            .map_err(|e| SearchError::invalid_response("brave", e.to_string()))?;

        let total = results.len() as f64;
        Ok(results
            .into_iter()
            .enumerate()
            .map(|(i, r)| SearchResult {
                title: r.title,
                url: r.url,
                content: r.description,
                score: 1.0 - i as f64 / total,
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let count = options.max_results.min(BRAVE_MAX_COUNT);
        log::debug!(
            "Brave search ignores depth {}, using count {}",
            options.depth.as_str(),
            count
        );

        let mut url = reqwest::Url::parse("https://api.search.brave.com/res/v1/web/search")
            .map_err(|e| SearchError::provider("brave", e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("count", &count.to_string());

        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(SearchError::provider(
                "brave",
                format!("status {}: {}", status, text),
            ));
        }

        let body: Value = resp.json().await?;
        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_scores_by_rank() {
        let body = json!({
            "web": {
                "results": [
                    {"title": "A", "url": "https://a.example", "description": "first"},
                    {"title": "B", "url": "https://b.example", "description": "second"},
                    {"title": "C", "url": "https://c.example"}
                ]
            }
        });

        let results = BraveSearch::parse_response(&body).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].content, "first");
        assert_eq!(results[0].score, 1.0);
        assert!(results[1].score > results[2].score);
        assert_eq!(results[2].content, "");
    }

    #[test]
    fn test_parse_response_without_web_section() {
        let results = BraveSearch::parse_response(&json!({"query": {}})).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_response_malformed() {
        let body = json!({"web": {"results": [{"title": 1}]}});
        assert!(BraveSearch::parse_response(&body).is_err());
    }
}
