// SPDX-License-Identifier: MIT

//! Typed error handling for research-rs
//!
//! Each layer owns its error type: collaborators fail with [`ModelError`] or
//! [`SearchError`], nodes with [`NodeError`], graph construction with
//! [`WorkflowError`] and a run with [`ExecutionError`]. [`ResearchError`] is
//! the top-level type handed to the CLI and the HTTP server.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for research-rs
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Configuration errors (missing env vars, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Graph construction errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// A run that aborted
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ResearchError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Errors detected while building a graph, before anything runs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Graph has no entry point")]
    MissingEntry,

    #[error("Node '{0}' is registered twice")]
    DuplicateNode(String),

    #[error("Edge references unknown node '{0}'")]
    UnknownNode(String),

    #[error("Node '{0}' has more than one outgoing edge")]
    DuplicateEdge(String),

    /// Circular dependency detected between nodes
    #[error("Circular dependency detected: {0:?}")]
    CircularDependency(Vec<String>),

    #[error("Node '{0}' has no path to the end of the graph")]
    NoPathToEnd(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Model not supported
    #[error("Model provider not supported: {0}")]
    UnsupportedProvider(String),

    /// Non-success response from the provider
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ModelError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Search provider errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0} must be set")]
    ApiKeyMissing(String),

    #[error("Search provider {provider} returned an error: {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl SearchError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Failure raised by a single node
#[derive(Debug, Error)]
pub enum NodeError {
    /// The text-generation collaborator failed
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    /// The planner reply did not contain a usable plan
    #[error("could not parse plan from model reply: {0}")]
    PlanParse(String),

    /// Search ran without a plan to execute
    #[error("search requires a plan with at least one query")]
    MissingPlan,
}

/// A run that did not reach the end of the graph
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("node '{node}' failed: {source}")]
    Node {
        node: String,
        #[source]
        source: NodeError,
    },

    #[error("node '{0}' is not registered")]
    UnknownNode(String),

    /// The node exists but nothing says where to go after it
    #[error("node '{0}' has no outgoing edge")]
    NoOutgoingEdge(String),

    #[error("run exceeded {0:?}")]
    Timeout(Duration),
}

impl ExecutionError {
    /// Name of the node that failed, if the failure came from a node
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::Node { node, .. } => Some(node),
            _ => None,
        }
    }
}
