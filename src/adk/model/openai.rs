// SPDX-License-Identifier: MIT

//! OpenAI Model - Chat Completions API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

/// OpenAI chat model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("openai".to_string()))?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    /// Convert internal Content to OpenAI message format
    fn content_to_openai_message(content: &Content) -> Value {
        let role = match content.role.as_str() {
            "system" => "system",
            "user" => "user",
            "model" => "assistant",
            other => other,
        };

        let text: String = content
            .parts
            .iter()
            .map(|p| match p {
                Part::Text(t) | Part::Thinking(t) => t.as_str(),
            })
            .collect();

        json!({
            "role": role,
            "content": text
        })
    }

    /// Build the request body for a chat completion
    fn build_request_body(&self, history: &[Content], config: Option<&GenerationConfig>) -> Value {
        let messages: Vec<Value> = history
            .iter()
            .map(Self::content_to_openai_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
            if let Some(schema) = &cfg.response_schema {
                body["response_format"] = json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": "structured_reply",
                        "schema": schema
                    }
                });
            }
        }

        body
    }

    /// Parse OpenAI response into Content
    fn parse_openai_response(response: &Value) -> Result<Content, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("no choices in OpenAI response".into()))?;

        // Structured output requests may be declined instead of answered
        if let Some(refusal) = choice["message"]["refusal"].as_str() {
            return Err(ModelError::api("openai", format!("refused: {}", refusal)));
        }

        let mut parts = Vec::new();
        if let Some(content) = choice["message"]["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text(content.to_string()));
            }
        }

        if let Some(reason) = choice["finish_reason"].as_str() {
            log::debug!("OpenAI finish reason: {}", reason);
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(history, config);

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(ModelError::api("openai", format!("status {}: {}", status, text)));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_openai_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> OpenAIModel {
        OpenAIModel {
            client: Client::new(),
            api_key: "test".to_string(),
            model_name: "gpt-4o-mini".to_string(),
            base_url: "http://localhost".to_string(),
        }
    }

    #[test]
    fn test_content_to_openai_messages() {
        let msg = OpenAIModel::content_to_openai_message(&Content::user("Hello"));
        assert_eq!(msg["role"], "user");
        assert_eq!(msg["content"], "Hello");

        let msg = OpenAIModel::content_to_openai_message(&Content::system("You are helpful"));
        assert_eq!(msg["role"], "system");

        let msg = OpenAIModel::content_to_openai_message(&Content::model("I can help"));
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["content"], "I can help");
    }

    #[test]
    fn test_request_body_with_schema() {
        let config = GenerationConfig {
            temperature: Some(0.0),
            response_schema: Some(json!({"type": "object"})),
            ..Default::default()
        };
        let body = model().build_request_body(&[Content::user("hi")], Some(&config));

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["type"],
            "object"
        );
    }

    #[test]
    fn test_request_body_without_config() {
        let body = model().build_request_body(&[Content::user("hi")], None);
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_openai_text_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello, how can I help?"
                },
                "finish_reason": "stop"
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.role, "model");
        assert_eq!(content.text(), "Hello, how can I help?");
    }

    #[test]
    fn test_parse_openai_refusal() {
        let response = json!({
            "choices": [{
                "message": {"role": "assistant", "content": null, "refusal": "I can't help with that."},
                "finish_reason": "stop"
            }]
        });
        let err = OpenAIModel::parse_openai_response(&response).unwrap_err();
        assert!(matches!(err, ModelError::Api { .. }));
    }

    #[test]
    fn test_parse_openai_without_choices() {
        let err = OpenAIModel::parse_openai_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }
}
