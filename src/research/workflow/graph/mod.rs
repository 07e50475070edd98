// SPDX-License-Identifier: MIT

//! Graph-based workflow execution
//!
//! This module provides the graph builder and the executor that drives a
//! state through nodes, applying each node's update before following the
//! node's outgoing edge.

mod builder;
pub mod executor;
pub mod types;

pub use builder::GraphBuilder;
pub use executor::CompiledGraph;
pub use types::{Edge, GraphEvent, Node, Route, Router, Target};
