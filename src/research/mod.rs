// SPDX-License-Identifier: MIT

//! Automated research: validate a question, plan searches, gather results
//! and write a cited report.

pub mod config;
pub mod nodes;
pub mod pipeline;
pub mod router;
pub mod server;
pub mod tools;
pub mod types;
pub mod workflow;

pub use config::ResearchConfig;
pub use pipeline::{build_research_graph, PipelineParts, Researcher};
pub use workflow::state::ResearchState;
