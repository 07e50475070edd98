// SPDX-License-Identifier: MIT

//! Search node - runs every planned query against the search provider

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use super::SEARCH;
use crate::adk::error::{NodeError, SearchError};
use crate::research::tools::search::{SearchOptions, SearchProvider};
use crate::research::types::SearchResult;
use crate::research::workflow::graph::Node;
use crate::research::workflow::state::{MetadataUpdate, ResearchState, StateUpdate};

pub struct SearchNode {
    provider: Arc<dyn SearchProvider>,
    options: SearchOptions,
    concurrent: bool,
}

impl SearchNode {
    pub fn new(provider: Arc<dyn SearchProvider>, options: SearchOptions) -> Self {
        Self {
            provider,
            options,
            concurrent: false,
        }
    }

    /// Issue the per-query requests concurrently. Results are still collected
    /// in query order.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    async fn search_all(&self, queries: &[String]) -> Vec<Result<Vec<SearchResult>, SearchError>> {
        if self.concurrent {
            join_all(
                queries
                    .iter()
                    .map(|q| self.provider.search(q, &self.options)),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(queries.len());
            for query in queries {
                outcomes.push(self.provider.search(query, &self.options).await);
            }
            outcomes
        }
    }
}

#[async_trait]
impl Node<ResearchState> for SearchNode {
    fn name(&self) -> &str {
        SEARCH
    }

    async fn run(&self, state: &ResearchState) -> Result<StateUpdate, NodeError> {
        let queries = match state.plan() {
            Some(plan) if !plan.queries.is_empty() => &plan.queries,
            _ => return Err(NodeError::MissingPlan),
        };

        let outcomes = self.search_all(queries).await;

        let mut results = Vec::new();
        let mut failed = 0;
        for (query, outcome) in queries.iter().zip(outcomes) {
            match outcome {
                Ok(found) => {
                    log::info!(
                        "{} returned {} results for {:?}",
                        self.provider.name(),
                        found.len(),
                        query
                    );
                    results.extend(found);
                }
                Err(e) => {
                    log::warn!("Search failed for {:?}, skipping: {}", query, e);
                    failed += 1;
                }
            }
        }

        // Every query failing still completes the step; synthesis then
        // reports that nothing was found.
        if failed == queries.len() {
            log::warn!("All {} search queries failed", failed);
        }

        Ok(StateUpdate {
            search_results: Some(results),
            run_metadata: Some(MetadataUpdate::step(SEARCH)),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::types::Plan;
    use crate::research::workflow::state::GraphState;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted provider: queries missing from the script fail
    struct MockSearch {
        script: HashMap<String, Vec<SearchResult>>,
        delays: HashMap<String, u64>,
        calls: Mutex<Vec<String>>,
    }

    impl MockSearch {
        fn new(script: &[(&str, usize)]) -> Self {
            Self {
                script: script
                    .iter()
                    .map(|(q, n)| (q.to_string(), hits(q, *n)))
                    .collect(),
                delays: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, query: &str, millis: u64) -> Self {
            self.delays.insert(query.to_string(), millis);
            self
        }
    }

    #[async_trait]
    impl SearchProvider for MockSearch {
        fn name(&self) -> &str {
            "mock"
        }

        async fn search(
            &self,
            query: &str,
            _options: &SearchOptions,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.lock().unwrap().push(query.to_string());
            if let Some(millis) = self.delays.get(query) {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            self.script
                .get(query)
                .cloned()
                .ok_or_else(|| SearchError::provider("mock", "rate limited"))
        }
    }

    fn hits(query: &str, n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| SearchResult {
                title: format!("{} {}", query, i),
                url: format!("https://example.com/{}/{}", query, i),
                content: "content".to_string(),
                score: 0.9,
            })
            .collect()
    }

    fn planned(queries: &[&str]) -> ResearchState {
        ResearchState::new("question").apply(StateUpdate {
            plan: Some(Plan {
                queries: queries.iter().map(|q| q.to_string()).collect(),
                reasoning: "r".to_string(),
            }),
            ..Default::default()
        })
    }

    fn titles(update: &StateUpdate) -> Vec<String> {
        update
            .search_results
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| r.title.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_missing_plan() {
        let node = SearchNode::new(Arc::new(MockSearch::new(&[])), SearchOptions::default());
        let err = node.run(&ResearchState::new("q")).await.unwrap_err();
        assert!(matches!(err, NodeError::MissingPlan));
    }

    #[tokio::test]
    async fn test_empty_queries_is_missing_plan() {
        let node = SearchNode::new(Arc::new(MockSearch::new(&[])), SearchOptions::default());
        let err = node.run(&planned(&[])).await.unwrap_err();
        assert!(matches!(err, NodeError::MissingPlan));
    }

    #[tokio::test]
    async fn test_failed_query_is_skipped() {
        let provider = Arc::new(MockSearch::new(&[("q1", 2), ("q3", 1)]));
        let node = SearchNode::new(provider.clone(), SearchOptions::default());

        let update = node.run(&planned(&["q1", "q2", "q3"])).await.unwrap();

        assert_eq!(titles(&update), vec!["q1 0", "q1 1", "q3 0"]);
        assert_eq!(update.run_metadata, Some(MetadataUpdate::step("search")));
        assert_eq!(*provider.calls.lock().unwrap(), vec!["q1", "q2", "q3"]);
    }

    #[tokio::test]
    async fn test_all_queries_failing_completes_empty() {
        let node = SearchNode::new(Arc::new(MockSearch::new(&[])), SearchOptions::default());
        let update = node.run(&planned(&["q1", "q2"])).await.unwrap();
        assert_eq!(update.search_results, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_concurrent_keeps_query_order() {
        // q1 finishes last but its results still come first
        let provider = MockSearch::new(&[("q1", 1), ("q2", 1), ("q3", 1)]).with_delay("q1", 30);
        let node = SearchNode::new(Arc::new(provider), SearchOptions::default()).concurrent(true);

        let update = node.run(&planned(&["q1", "q2", "q3"])).await.unwrap();
        assert_eq!(titles(&update), vec!["q1 0", "q2 0", "q3 0"]);
    }

    #[tokio::test]
    async fn test_concurrent_failure_is_isolated() {
        let provider = MockSearch::new(&[("q1", 2), ("q3", 1)]).with_delay("q3", 10);
        let node = SearchNode::new(Arc::new(provider), SearchOptions::default()).concurrent(true);

        let update = node.run(&planned(&["q1", "q2", "q3"])).await.unwrap();
        assert_eq!(titles(&update), vec!["q1 0", "q1 1", "q3 0"]);
    }
}
