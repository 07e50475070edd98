// SPDX-License-Identifier: MIT

//! Structured replies - ask a model for a value of a known shape

use super::{generate_text, GenerationConfig, Model};
use crate::adk::error::ModelError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Generate a reply and deserialize it into `T`.
///
/// The JSON schema of `T` travels in [`GenerationConfig::response_schema`] so
/// providers with native structured output can enforce it. The reply is then
/// parsed from the first JSON object found in the text.
pub async fn generate_structured<T>(
    model: &dyn Model,
    system: &str,
    user: &str,
    config: Option<&GenerationConfig>,
) -> Result<T, ModelError>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = serde_json::to_value(schemars::schema_for!(T))
        .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

    let mut config = config.cloned().unwrap_or_default();
    config.response_schema = Some(schema);

    let text = generate_text(model, system, user, Some(&config)).await?;
    let json = extract_json_object(&text).ok_or_else(|| {
        ModelError::InvalidResponse(format!("no JSON object in reply: {}", preview(&text)))
    })?;

    serde_json::from_str(json).map_err(|e| {
        ModelError::InvalidResponse(format!("reply does not match expected shape: {}", e))
    })
}

/// Locate a JSON object in model output.
///
/// A ```json fenced block wins, then any fenced block, then the outermost
/// `{ ... }` span of the text.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(block) = fenced_block(text, "```json").or_else(|| fenced_block(text, "```")) {
        let block = block.trim();
        if block.starts_with('{') && block.ends_with('}') {
            return Some(block);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn fenced_block<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let start = text.find(fence)? + fence.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(&rest[..end])
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}
