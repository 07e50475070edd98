// SPDX-License-Identifier: MIT

//! Web search collaborator
//!
//! [SearchProvider] is the seam the search node talks to. Backends:
//! - [tavily] - Tavily search API (scored results)
//! - [brave] - Brave web search API (rank-derived scores)

pub mod brave;
pub mod tavily;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::adk::error::{ResearchError, SearchError};
use crate::research::types::SearchResult;

/// How hard the provider should look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
}

impl SearchDepth {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

impl FromStr for SearchDepth {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            other => Err(ResearchError::config(format!(
                "unknown search depth: {}",
                other
            ))),
        }
    }
}

/// Per-request search options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub depth: SearchDepth,
    pub max_results: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            depth: SearchDepth::Advanced,
            max_results: 5,
        }
    }
}

/// A web search backend.
///
/// Zero results is a valid answer, not an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name, used in logs
    fn name(&self) -> &str;

    /// Run one query and return ranked results
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError>;
}

/// Supported search backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProviderKind {
    #[default]
    Tavily,
    Brave,
}

impl SearchProviderKind {
    /// Build a client for this backend; API keys come from the environment
    pub fn create(self) -> Result<Arc<dyn SearchProvider>, SearchError> {
        Ok(match self {
            Self::Tavily => Arc::new(tavily::TavilySearch::new()?),
            Self::Brave => Arc::new(brave::BraveSearch::new()?),
        })
    }
}

impl FromStr for SearchProviderKind {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tavily" => Ok(Self::Tavily),
            "brave" => Ok(Self::Brave),
            other => Err(ResearchError::config(format!(
                "unknown search provider: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SearchProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tavily => f.write_str("tavily"),
            Self::Brave => f.write_str("brave"),
        }
    }
}
