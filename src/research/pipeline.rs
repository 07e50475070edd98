// SPDX-License-Identifier: MIT

//! Research pipeline
//!
//! Wires the four nodes into a graph:
//!
//! ```text
//! validate --continue--> plan --> search --> synthesize --> END
//!     \--reject--> END
//! ```
//!
//! and exposes [Researcher] as the entry point for callers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::adk::error::{ExecutionError, ResearchError, WorkflowError};
use crate::adk::model::{GenerationConfig, Model};
use crate::research::config::ResearchConfig;
use crate::research::nodes::{
    PlanNode, SearchNode, SynthesizeNode, ValidateNode, PLAN, SEARCH, SYNTHESIZE, VALIDATE,
};
use crate::research::router::validation_gate;
use crate::research::tools::search::{SearchOptions, SearchProvider};
use crate::research::workflow::graph::{CompiledGraph, GraphBuilder, GraphEvent, Target};
use crate::research::workflow::state::ResearchState;

/// Collaborators and settings the research graph is built from
pub struct PipelineParts {
    pub model: Arc<dyn Model>,
    pub search: Arc<dyn SearchProvider>,
    pub generation: GenerationConfig,
    pub search_options: SearchOptions,
    pub concurrent_search: bool,
}

impl PipelineParts {
    pub fn new(model: Arc<dyn Model>, search: Arc<dyn SearchProvider>) -> Self {
        Self {
            model,
            search,
            generation: GenerationConfig::default(),
            search_options: SearchOptions::default(),
            concurrent_search: false,
        }
    }
}

/// Build and validate the research graph
pub fn build_research_graph(
    parts: PipelineParts,
) -> Result<CompiledGraph<ResearchState>, WorkflowError> {
    let search = SearchNode::new(parts.search, parts.search_options)
        .concurrent(parts.concurrent_search);

    GraphBuilder::new()
        .add_node(ValidateNode::new(parts.model.clone()))
        .add_node(PlanNode::new(parts.model.clone(), parts.generation.clone()))
        .add_node(search)
        .add_node(SynthesizeNode::new(parts.model, parts.generation))
        .set_entry_point(VALIDATE)
        .add_conditional_edge(
            VALIDATE,
            validation_gate,
            Target::node(PLAN),
            Target::End,
        )
        .add_edge(PLAN, Target::node(SEARCH))
        .add_edge(SEARCH, Target::node(SYNTHESIZE))
        .add_edge(SYNTHESIZE, Target::End)
        .compile()
}

/// Runs research tasks. Each call gets a fresh state; one `Researcher` can
/// serve any number of concurrent runs.
pub struct Researcher {
    graph: CompiledGraph<ResearchState>,
    timeout: Option<Duration>,
}

impl Researcher {
    pub fn new(parts: PipelineParts) -> Result<Self, ResearchError> {
        Ok(Self {
            graph: build_research_graph(parts)?,
            timeout: None,
        })
    }

    /// Build the model and search clients named by `config`
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ResearchError> {
        let provider = config.model.provider();
        log::info!(
            "Using model {} ({}), search provider {}",
            config.model.name,
            provider,
            config.search.provider
        );

        let model = provider.create(config.model.name.clone())?;
        let search = config.search.provider.create()?;

        let parts = PipelineParts {
            model,
            search,
            generation: config.model.generation_config(),
            search_options: config.search.options(),
            concurrent_search: config.search.concurrent,
        };
        Ok(Self::new(parts)?.with_timeout(config.run.timeout()))
    }

    /// Overall wall-clock limit per run
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer one question.
    ///
    /// A rejected question is not an error: the returned state has
    /// `is_valid_question() == false` and no report.
    pub async fn run_research(&self, question: &str) -> Result<ResearchState, ResearchError> {
        let state = ResearchState::new(question);
        log::info!("Starting run {}", state.run_metadata().run_id);
        self.bounded(self.graph.run(state)).await
    }

    /// Like [Researcher::run_research], reporting progress on `tx`
    pub async fn run_research_stream(
        &self,
        question: &str,
        tx: mpsc::Sender<GraphEvent>,
    ) -> Result<ResearchState, ResearchError> {
        let state = ResearchState::new(question);
        log::info!("Starting streamed run {}", state.run_metadata().run_id);
        self.bounded(self.graph.run_stream(state, tx)).await
    }

    async fn bounded<F>(&self, run: F) -> Result<ResearchState, ResearchError>
    where
        F: Future<Output = Result<ResearchState, ExecutionError>>,
    {
        let state = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| ExecutionError::Timeout(limit))??,
            None => run.await?,
        };
        log::info!("Run {} finished", state.run_metadata().run_id);
        Ok(state)
    }
}
