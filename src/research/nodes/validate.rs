// SPDX-License-Identifier: MIT

//! Validate node - decides whether the question is worth researching

use async_trait::async_trait;
use std::sync::Arc;

use super::{prompts, VALIDATE};
use crate::adk::error::NodeError;
use crate::adk::model::{generate_structured, GenerationConfig, Model};
use crate::research::types::ValidationVerdict;
use crate::research::workflow::graph::Node;
use crate::research::workflow::state::{MetadataUpdate, ResearchState, StateUpdate};

pub struct ValidateNode {
    model: Arc<dyn Model>,
}

impl ValidateNode {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node<ResearchState> for ValidateNode {
    fn name(&self) -> &str {
        VALIDATE
    }

    async fn run(&self, state: &ResearchState) -> Result<StateUpdate, NodeError> {
        // Verdicts must be repeatable for the same question
        let config = GenerationConfig {
            temperature: Some(0.0),
            ..Default::default()
        };

        let verdict: ValidationVerdict = generate_structured(
            self.model.as_ref(),
            prompts::VALIDATE_SYSTEM,
            state.question(),
            Some(&config),
        )
        .await?;

        log::info!("Question valid: {} ({})", verdict.valid, verdict.reason);

        Ok(StateUpdate {
            is_valid_question: Some(Some(verdict.valid)),
            validation: Some(verdict),
            run_metadata: Some(MetadataUpdate::step(VALIDATE)),
            ..Default::default()
        })
    }
}
