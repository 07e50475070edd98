// SPDX-License-Identifier: MIT

//! Plan node - turns the question into a handful of search queries

use async_trait::async_trait;
use std::sync::Arc;

use super::{prompts, PLAN};
use crate::adk::error::NodeError;
use crate::adk::model::{extract_json_object, generate_text, GenerationConfig, Model};
use crate::research::types::Plan;
use crate::research::workflow::graph::Node;
use crate::research::workflow::state::{MetadataUpdate, ResearchState, StateUpdate};

const MIN_QUERIES: usize = 2;
const MAX_QUERIES: usize = 4;

pub struct PlanNode {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl PlanNode {
    pub fn new(model: Arc<dyn Model>, config: GenerationConfig) -> Self {
        Self { model, config }
    }
}

/// Parse the planner reply.
///
/// A reply without a JSON object of the expected shape, or whose queries are
/// all blank, fails the run; there is no re-prompt and no fallback plan.
pub fn parse_plan(reply: &str) -> Result<Plan, NodeError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| NodeError::PlanParse("reply contains no JSON object".to_string()))?;

    let mut plan: Plan =
        serde_json::from_str(json).map_err(|e| NodeError::PlanParse(e.to_string()))?;

    plan.queries = plan
        .queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if plan.queries.is_empty() {
        return Err(NodeError::PlanParse("plan has no queries".to_string()));
    }
    if !(MIN_QUERIES..=MAX_QUERIES).contains(&plan.queries.len()) {
        log::warn!(
            "Planner returned {} queries, expected {} to {}",
            plan.queries.len(),
            MIN_QUERIES,
            MAX_QUERIES
        );
    }
    Ok(plan)
}

#[async_trait]
impl Node<ResearchState> for PlanNode {
    fn name(&self) -> &str {
        PLAN
    }

    async fn run(&self, state: &ResearchState) -> Result<StateUpdate, NodeError> {
        let reply = generate_text(
            self.model.as_ref(),
            prompts::PLAN_SYSTEM,
            &prompts::plan_request(state.question()),
            Some(&self.config),
        )
        .await?;

        let plan = parse_plan(&reply)?;
        log::info!("Planned {} queries: {:?}", plan.queries.len(), plan.queries);

        Ok(StateUpdate {
            plan: Some(plan),
            run_metadata: Some(MetadataUpdate::step(PLAN)),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::ModelError;
    use crate::adk::model::Content;

    struct ReplyModel(&'static str);

    #[async_trait]
    impl Model for ReplyModel {
        async fn generate_content(
            &self,
            _history: &[Content],
            _config: Option<&GenerationConfig>,
        ) -> Result<Content, ModelError> {
            Ok(Content::model(self.0))
        }
    }

    fn node(reply: &'static str) -> PlanNode {
        PlanNode::new(Arc::new(ReplyModel(reply)), GenerationConfig::default())
    }

    #[test]
    fn test_parse_fenced_plan() {
        let reply = "Here is my plan:\n```json\n{\"queries\": [\"photosynthesis process\", \" chlorophyll role \"], \"reasoning\": \"cover mechanism and pigments\"}\n```";
        let plan = parse_plan(reply).unwrap();
        assert_eq!(
            plan.queries,
            vec!["photosynthesis process", "chlorophyll role"]
        );
        assert_eq!(plan.reasoning, "cover mechanism and pigments");
    }

    #[test]
    fn test_parse_drops_blank_queries() {
        let plan = parse_plan(r#"{"queries": ["a", "  ", ""], "reasoning": "r"}"#).unwrap();
        assert_eq!(plan.queries, vec!["a"]);
    }

    #[test]
    fn test_parse_rejects_empty_plan() {
        for reply in [
            r#"{"queries": [], "reasoning": "nothing to search"}"#,
            r#"{"queries": ["  ", ""], "reasoning": "r"}"#,
        ] {
            let err = parse_plan(reply).unwrap_err();
            assert!(matches!(err, NodeError::PlanParse(ref m) if m.contains("no queries")));
        }
    }

    #[test]
    fn test_parse_keeps_single_query_plan() {
        let plan = parse_plan(r#"{"queries": ["only one"], "reasoning": "r"}"#).unwrap();
        assert_eq!(plan.queries, vec!["only one"]);
    }

    #[test]
    fn test_parse_without_json() {
        let err = parse_plan("I would search for photosynthesis.").unwrap_err();
        assert!(matches!(err, NodeError::PlanParse(_)));
    }

    #[test]
    fn test_parse_wrong_shape() {
        let err = parse_plan(r#"{"searches": ["a"]}"#).unwrap_err();
        assert!(matches!(err, NodeError::PlanParse(_)));
    }

    #[tokio::test]
    async fn test_run_sets_plan_and_step() {
        let update = node(r#"{"queries": ["q1", "q2"], "reasoning": "two angles"}"#)
            .run(&ResearchState::new("question"))
            .await
            .unwrap();

        let plan = update.plan.unwrap();
        assert_eq!(plan.queries, vec!["q1", "q2"]);
        assert_eq!(update.run_metadata, Some(MetadataUpdate::step("plan")));
        assert!(update.search_results.is_none());
    }

    #[tokio::test]
    async fn test_run_fails_on_empty_plan() {
        let err = node(r#"{"queries": [], "reasoning": "nothing"}"#)
            .run(&ResearchState::new("question"))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::PlanParse(_)));
    }

    #[tokio::test]
    async fn test_run_fails_on_unparseable_reply() {
        let err = node("no plan today")
            .run(&ResearchState::new("question"))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::PlanParse(_)));
    }
}
