// SPDX-License-Identifier: MIT

//! Anthropic Model - Claude Messages API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic Claude model implementation
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl AnthropicModel {
    /// Create a new AnthropicModel
    ///
    /// Requires `ANTHROPIC_API_KEY` environment variable to be set.
    /// Optionally uses `ANTHROPIC_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("anthropic".to_string()))?;
        let base_url = env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    /// Extract system message from history
    fn extract_system_message(history: &[Content]) -> Option<String> {
        history
            .iter()
            .find(|c| c.role == "system")
            .map(Content::text)
            .filter(|t| !t.is_empty())
    }

    /// System prompt with the structured-output contract appended.
    ///
    /// The Messages API has no native JSON schema mode, so the schema is
    /// spelled out as an instruction instead.
    fn system_prompt(history: &[Content], config: Option<&GenerationConfig>) -> Option<String> {
        let system = Self::extract_system_message(history);
        let Some(schema) = config.and_then(|c| c.response_schema.as_ref()) else {
            return system;
        };

        let contract = format!(
            "Reply with a single JSON object in a ```json fenced block matching this JSON schema:\n{}",
            serde_json::to_string_pretty(schema).unwrap_or_default()
        );
        Some(match system {
            Some(sys) => format!("{}\n\n{}", sys, contract),
            None => contract,
        })
    }

    /// Convert internal Content to Anthropic message format
    fn content_to_anthropic_message(content: &Content) -> Option<Value> {
        // Skip system messages (handled separately)
        if content.role == "system" {
            return None;
        }

        let role = match content.role.as_str() {
            "user" => "user",
            "model" => "assistant",
            other => other,
        };

        // Thinking blocks cannot be replayed without their signature
        let blocks: Vec<Value> = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(t) => Some(json!({ "type": "text", "text": t })),
                Part::Thinking(_) => None,
            })
            .collect();

        if blocks.is_empty() {
            return None;
        }

        Some(json!({
            "role": role,
            "content": blocks
        }))
    }

    fn request_body(&self, history: &[Content], config: Option<&GenerationConfig>) -> Value {
        let messages: Vec<Value> = history
            .iter()
            .filter_map(Self::content_to_anthropic_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages,
            "max_tokens": config
                .and_then(|c| c.max_output_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
        });

        if let Some(sys) = Self::system_prompt(history, config) {
            body["system"] = json!(sys);
        }
        if let Some(temp) = config.and_then(|c| c.temperature) {
            body["temperature"] = json!(temp);
        }
        if let Some(top_p) = config.and_then(|c| c.top_p) {
            body["top_p"] = json!(top_p);
        }
        body
    }

    /// Parse Anthropic response into Content
    fn parse_anthropic_response(response: &Value) -> Result<Content, ModelError> {
        let content_blocks = response["content"].as_array().ok_or_else(|| {
            ModelError::InvalidResponse("no content in Anthropic response".to_string())
        })?;

        let mut parts = Vec::new();
        for block in content_blocks {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(text) = block["text"].as_str().filter(|t| !t.is_empty()) {
                        parts.push(Part::Text(text.to_string()));
                    }
                }
                Some("thinking") => {
                    if let Some(thinking) = block["thinking"].as_str().filter(|t| !t.is_empty()) {
                        parts.push(Part::Thinking(thinking.to_string()));
                    }
                }
                _ => {}
            }
        }

        if let Some(stop_reason) = response["stop_reason"].as_str() {
            log::debug!("Anthropic stop reason: {}", stop_reason);
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for AnthropicModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let url = format!("{}/messages", self.base_url);
        let body = self.request_body(history, config);

        log::debug!(
            "Anthropic request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(ModelError::api(
                "anthropic",
                format!("status {}: {}", status, text),
            ));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Anthropic response: {}", resp_json);

        Self::parse_anthropic_response(&resp_json)
    }
}
