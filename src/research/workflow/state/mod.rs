// SPDX-License-Identifier: MIT

//! State management for graph workflows
//!
//! This module provides:
//! - `GraphState` - what the executor needs from a state type
//! - `StateSchema` - declares each research state field and its reducer
//! - `ResearchState` / `StateUpdate` - the research state and its partial update
//! - `reducer` - the pure merge functions behind each reducer type

pub mod reducer;
mod schema;
mod store;

pub use schema::{FieldType, ReducerType, StateField, StateFieldDef, StateSchema, STATE_SCHEMA};
pub use store::{MetadataUpdate, ResearchState, RunMetadata, StateUpdate};

/// A state threaded through a graph run.
///
/// Nodes never mutate the state: they return an `Update`, and the executor
/// folds it in with `apply`, which must be deterministic and side-effect free.
pub trait GraphState: Clone + Send + Sync + 'static {
    /// Partial update produced by a node
    type Update: Send + 'static;

    /// Merge an update into the state, field by field
    fn apply(self, update: Self::Update) -> Self;
}
