// SPDX-License-Identifier: MIT

//! Synthesize node - writes the cited report

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::{prompts, SYNTHESIZE};
use crate::adk::error::NodeError;
use crate::adk::model::{generate_text, GenerationConfig, Model};
use crate::research::workflow::graph::Node;
use crate::research::workflow::state::{MetadataUpdate, ResearchState, StateUpdate};

pub struct SynthesizeNode {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl SynthesizeNode {
    pub fn new(model: Arc<dyn Model>, config: GenerationConfig) -> Self {
        Self { model, config }
    }
}

#[async_trait]
impl Node<ResearchState> for SynthesizeNode {
    fn name(&self) -> &str {
        SYNTHESIZE
    }

    async fn run(&self, state: &ResearchState) -> Result<StateUpdate, NodeError> {
        let results = state.search_results();

        if results.is_empty() {
            log::warn!("No search results, skipping synthesis");
            return Ok(StateUpdate {
                report: Some(prompts::NO_RESULTS_REPORT.to_string()),
                run_metadata: Some(MetadataUpdate::finished(SYNTHESIZE, Utc::now())),
                ..Default::default()
            });
        }

        log::info!("Synthesizing report from {} results", results.len());
        let report = generate_text(
            self.model.as_ref(),
            prompts::SYNTHESIZE_SYSTEM,
            &prompts::synthesize_request(state.question(), results),
            Some(&self.config),
        )
        .await?;

        Ok(StateUpdate {
            report: Some(report),
            run_metadata: Some(MetadataUpdate::finished(SYNTHESIZE, Utc::now())),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::ModelError;
    use crate::adk::model::Content;
    use crate::research::types::SearchResult;
    use crate::research::workflow::state::GraphState;
    use std::sync::Mutex;

    /// Records the prompt it was given and replies with a fixed report
    struct RecordingModel {
        reply: Option<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingModel {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Model for RecordingModel {
        async fn generate_content(
            &self,
            history: &[Content],
            _config: Option<&GenerationConfig>,
        ) -> Result<Content, ModelError> {
            let prompt = history.last().map(|c| c.text()).unwrap_or_default();
            self.seen.lock().unwrap().push(prompt);
            self.reply
                .map(Content::model)
                .ok_or_else(|| ModelError::api("mock", "overloaded"))
        }
    }

    fn with_results(n: usize) -> ResearchState {
        let results = (1..=n)
            .map(|i| SearchResult {
                title: format!("Source {}", i),
                url: format!("https://example.com/{}", i),
                content: format!("Fact number {}.", i),
                score: 0.8,
            })
            .collect();
        ResearchState::new("What is photosynthesis?").apply(StateUpdate {
            search_results: Some(results),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_empty_results_short_circuit() {
        let model = Arc::new(RecordingModel::replying("unused"));
        let node = SynthesizeNode::new(model.clone(), GenerationConfig::default());

        let update = node.run(&ResearchState::new("q")).await.unwrap();

        assert_eq!(update.report.as_deref(), Some(prompts::NO_RESULTS_REPORT));
        let meta = update.run_metadata.unwrap();
        assert_eq!(meta.steps, vec!["synthesize"]);
        assert!(meta.end_time.is_some());
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_is_raw_reply() {
        let model = Arc::new(RecordingModel::replying(
            "Plants convert light into chemical energy [1][2].",
        ));
        let node = SynthesizeNode::new(model.clone(), GenerationConfig::default());
        let state = with_results(2);

        let update = node.run(&state).await.unwrap();

        assert_eq!(
            update.report.as_deref(),
            Some("Plants convert light into chemical energy [1][2].")
        );
        let meta = update.run_metadata.unwrap();
        assert!(meta.end_time.unwrap() >= state.run_metadata().start_time);

        let seen = model.seen.lock().unwrap();
        assert!(seen[0].contains("[1] Source 1"));
        assert!(seen[0].contains("[2] Source 2"));
    }

    #[tokio::test]
    async fn test_model_failure_is_fatal() {
        let node = SynthesizeNode::new(
            Arc::new(RecordingModel::failing()),
            GenerationConfig::default(),
        );
        let err = node.run(&with_results(1)).await.unwrap_err();
        assert!(matches!(err, NodeError::Model(_)));
    }
}
