// SPDX-License-Identifier: MIT

//! Tavily search API backend

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;

use super::{SearchOptions, SearchProvider};
use crate::adk::error::SearchError;
use crate::research::types::SearchResult;

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

pub struct TavilySearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TavilySearch {
    /// Requires `TAVILY_API_KEY`; `TAVILY_BASE_URL` overrides the endpoint.
    pub fn new() -> Result<Self, SearchError> {
        let api_key = env::var("TAVILY_API_KEY")
            .map_err(|_| SearchError::ApiKeyMissing("TAVILY_API_KEY".to_string()))?;
        let base_url =
            env::var("TAVILY_BASE_URL").unwrap_or_else(|_| "https://api.tavily.com".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url,
        })
    }

    fn request_body(query: &str, options: &SearchOptions) -> Value {
        json!({
            "query": query,
            "search_depth": options.depth.as_str(),
            "max_results": options.max_results,
            "include_answer": false,
            "include_raw_content": false
        })
    }

    fn parse_response(body: &Value) -> Result<Vec<SearchResult>, SearchError> {
        let results = body
            .get("results")
            .ok_or_else(|| SearchError::invalid_response("tavily", "missing results"))?;

        let results: Vec<TavilyResult> = serde_json::from_value(results.clone())
            .map_err(|e| SearchError::invalid_response("tavily", e.to_string()))?;

        Ok(results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                content: r.content,
                score: r.score,
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let body = Self::request_body(query, options);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(SearchError::provider(
                "tavily",
                format!("status {}: {}", status, text),
            ));
        }

        let payload: Value = resp.json().await?;
        Self::parse_response(&payload)
    }
}
