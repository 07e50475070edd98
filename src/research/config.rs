// SPDX-License-Identifier: MIT

//! Research configuration
//!
//! Resolved in three layers: built-in defaults, an optional YAML file, then
//! `RESEARCH_*` environment variables. API keys are never part of the file;
//! each backend reads its own key from the environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::adk::error::ResearchError;
use crate::adk::model::{GenerationConfig, ModelProvider};
use crate::research::tools::search::{SearchDepth, SearchOptions, SearchProviderKind};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub model: ModelSettings,
    pub search: SearchSettings,
    pub run: RunSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Inferred from `name` when unset
    pub provider: Option<ModelProvider>,
    pub name: String,
    pub temperature: Option<f32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: None,
            name: DEFAULT_MODEL.to_string(),
            temperature: None,
        }
    }
}

impl ModelSettings {
    pub fn provider(&self) -> ModelProvider {
        self.provider.unwrap_or_else(|| ModelProvider::infer(&self.name))
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub provider: SearchProviderKind,
    pub depth: SearchDepth,
    pub max_results: u32,
    /// Issue per-query requests concurrently
    pub concurrent: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            provider: SearchProviderKind::default(),
            depth: options.depth,
            max_results: options.max_results,
            concurrent: false,
        }
    }
}

impl SearchSettings {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            depth: self.depth,
            max_results: self.max_results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Wall-clock limit for a whole run; unlimited when unset
    pub timeout_secs: Option<u64>,
}

impl RunSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ResearchConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ResearchError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResearchError> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    pub fn parse_yaml(content: &str) -> Result<Self, ResearchError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RESEARCH_*` overrides read through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ResearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("RESEARCH_MODEL") {
            self.model.name = name;
        }
        if let Some(provider) = lookup("RESEARCH_MODEL_PROVIDER") {
            let provider = provider
                .parse::<ModelProvider>()
                .map_err(|e| ResearchError::config(format!("RESEARCH_MODEL_PROVIDER: {}", e)))?;
            self.model.provider = Some(provider);
        }
        if let Some(provider) = lookup("RESEARCH_SEARCH_PROVIDER") {
            self.search.provider = provider.parse()?;
        }
        if let Some(depth) = lookup("RESEARCH_SEARCH_DEPTH") {
            self.search.depth = depth.parse()?;
        }
        if let Some(max) = lookup("RESEARCH_MAX_RESULTS") {
            self.search.max_results = parse_number("RESEARCH_MAX_RESULTS", &max)?;
        }
        if let Some(secs) = lookup("RESEARCH_TIMEOUT_SECS") {
            self.run.timeout_secs = Some(parse_number("RESEARCH_TIMEOUT_SECS", &secs)?);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ResearchError> {
        if self.model.name.trim().is_empty() {
            return Err(ResearchError::config("model name must not be empty"));
        }
        if self.search.max_results == 0 {
            return Err(ResearchError::config("search.max_results must be at least 1"));
        }
        if self.run.timeout_secs == Some(0) {
            return Err(ResearchError::config("run.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ResearchError> {
    value
        .trim()
        .parse()
        .map_err(|_| ResearchError::config(format!("{} is not a number: {}", key, value)))
}
