// SPDX-License-Identifier: MIT

//! Model module - defines LLM model trait and implementations
//!
//! This module provides the core Model trait and shared types.
//! Model implementations are in their own submodules:
//! - [anthropic] - Anthropic's Claude API
//! - [openai] - OpenAI's ChatGPT API
//!
//! [structured] layers "reply with a value of this shape" on top of any
//! [Model].

pub mod anthropic;
pub mod openai;
pub mod structured;

pub use structured::{extract_json_object, generate_structured};

use crate::adk::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// JSON schema the reply must conform to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts, ignoring thinking output
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Thinking(_) => None,
            })
            .collect()
    }
}

/// Parts of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models
    Thinking(String),
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError>;
}

/// Send a system instruction plus one user message and return the reply text.
///
/// An empty reply is an error: every caller in this crate needs text back.
pub async fn generate_text(
    model: &dyn Model,
    system: &str,
    user: &str,
    config: Option<&GenerationConfig>,
) -> Result<String, ModelError> {
    let history = [Content::system(system), Content::user(user)];
    let reply = model.generate_content(&history, config).await?;
    let text = reply.text();
    if text.trim().is_empty() {
        return Err(ModelError::InvalidResponse(
            "model returned no text".to_string(),
        ));
    }
    Ok(text)
}

/// Supported model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenAI,
    Anthropic,
}

impl ModelProvider {
    /// Infer provider from a model name
    pub fn infer(model_name: &str) -> Self {
        if model_name.starts_with("claude") {
            Self::Anthropic
        } else {
            Self::OpenAI
        }
    }

    /// Build a model client for this provider
    pub fn create(self, model_name: String) -> Result<Arc<dyn Model>, ModelError> {
        Ok(match self {
            Self::OpenAI => Arc::new(openai::OpenAIModel::new(model_name)?),
            Self::Anthropic => Arc::new(anthropic::AnthropicModel::new(model_name)?),
        })
    }
}

impl FromStr for ModelProvider {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ModelError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}
