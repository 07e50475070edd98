// SPDX-License-Identifier: MIT

//! Validation gate between the validate and plan nodes

use crate::research::workflow::graph::Route;
use crate::research::workflow::state::ResearchState;

/// Reject only on an explicit negative verdict
pub fn validation_gate(state: &ResearchState) -> Route {
    if state.is_valid_question() {
        Route::Continue
    } else {
        Route::Reject
    }
}
