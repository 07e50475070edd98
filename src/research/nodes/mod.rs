// SPDX-License-Identifier: MIT

//! The four research steps.
//!
//! Each node reads the state it needs and returns a [StateUpdate] touching
//! only the fields it owns, plus its own name appended to the run steps.
//!
//! [StateUpdate]: crate::research::workflow::state::StateUpdate

pub mod plan;
pub mod prompts;
pub mod search;
pub mod synthesize;
pub mod validate;

pub use plan::PlanNode;
pub use search::SearchNode;
pub use synthesize::SynthesizeNode;
pub use validate::ValidateNode;

pub const VALIDATE: &str = "validate";
pub const PLAN: &str = "plan";
pub const SEARCH: &str = "search";
pub const SYNTHESIZE: &str = "synthesize";
