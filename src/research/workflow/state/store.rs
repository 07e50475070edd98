// SPDX-License-Identifier: MIT

//! Runtime state storage for a research run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reducer::{self, field_default};
use super::schema::StateField;
use super::GraphState;
use crate::research::types::{Plan, SearchResult, ValidationVerdict};

/// Bookkeeping for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub run_id: Uuid,
    /// Completed nodes, in execution order
    pub steps: Vec<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Partial run metadata; `steps` is appended, the rest replaces when present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataUpdate {
    pub run_id: Option<Uuid>,
    pub steps: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl MetadataUpdate {
    /// Record one completed step
    pub fn step(name: impl Into<String>) -> Self {
        Self {
            steps: vec![name.into()],
            ..Default::default()
        }
    }

    /// Record the step that ends the run
    pub fn finished(name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            end_time: Some(at),
            ..Self::step(name)
        }
    }
}

/// Partial update returned by a node.
///
/// `None` means the node does not touch that field and its reducer is not
/// invoked. `question` has no slot: it is fixed when the state is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    /// `Some(None)` is a present but empty value, which resets the flag to
    /// its default of `true`.
    pub is_valid_question: Option<Option<bool>>,
    pub validation: Option<ValidationVerdict>,
    pub plan: Option<Plan>,
    pub search_results: Option<Vec<SearchResult>>,
    pub report: Option<String>,
    pub run_metadata: Option<MetadataUpdate>,
}

impl StateUpdate {
    /// Fields this update carries
    pub fn fields(&self) -> Vec<StateField> {
        let mut fields = Vec::new();
        if self.is_valid_question.is_some() {
            fields.push(StateField::IsValidQuestion);
        }
        if self.validation.is_some() {
            fields.push(StateField::Validation);
        }
        if self.plan.is_some() {
            fields.push(StateField::Plan);
        }
        if self.search_results.is_some() {
            fields.push(StateField::SearchResults);
        }
        if self.report.is_some() {
            fields.push(StateField::Report);
        }
        if self.run_metadata.is_some() {
            fields.push(StateField::RunMetadata);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// State of one research run.
///
/// Only [`GraphState::apply`] produces a changed state, so fields are read
/// through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchState {
    question: String,
    is_valid_question: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationVerdict>,
    #[serde(default)]
    plan: Option<Plan>,
    #[serde(default)]
    search_results: Vec<SearchResult>,
    #[serde(default)]
    report: Option<String>,
    run_metadata: RunMetadata,
}

impl ResearchState {
    /// Initial state for a question: every field at its default, a fresh run
    /// id and the start time set to now.
    pub fn new(question: impl Into<String>) -> Self {
        Self::started_at(question, Utc::now())
    }

    /// Initial state with an explicit start time
    pub fn started_at(question: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            question: question.into(),
            is_valid_question: field_default(StateField::IsValidQuestion),
            validation: field_default(StateField::Validation),
            plan: field_default(StateField::Plan),
            search_results: field_default(StateField::SearchResults),
            report: field_default(StateField::Report),
            run_metadata: RunMetadata {
                run_id: Uuid::new_v4(),
                steps: Vec::new(),
                start_time,
                end_time: None,
            },
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn is_valid_question(&self) -> bool {
        self.is_valid_question
    }

    pub fn validation(&self) -> Option<&ValidationVerdict> {
        self.validation.as_ref()
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn search_results(&self) -> &[SearchResult] {
        &self.search_results
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn run_metadata(&self) -> &RunMetadata {
        &self.run_metadata
    }

    /// Readable outcome of the run, including rejected questions which carry
    /// no report.
    pub fn summary(&self) -> String {
        if !self.is_valid_question {
            let mut text = String::from("The question was rejected");
            if let Some(verdict) = &self.validation {
                text.push_str(&format!(": {}", verdict.reason));
                if let Some(suggestion) = &verdict.suggestion {
                    text.push_str(&format!("\nTry instead: {}", suggestion));
                }
            } else {
                text.push('.');
            }
            return text;
        }

        match &self.report {
            Some(report) => report.clone(),
            None => "No report was produced.".to_string(),
        }
    }
}

impl GraphState for ResearchState {
    type Update = StateUpdate;

    fn apply(self, update: StateUpdate) -> Self {
        let StateUpdate {
            is_valid_question,
            validation,
            plan,
            search_results,
            report,
            run_metadata,
        } = update;

        let mut next = self;
        if let Some(flag) = is_valid_question {
            next.is_valid_question =
                reducer::reduce(StateField::IsValidQuestion, next.is_valid_question, flag);
        }
        if let Some(verdict) = validation {
            next.validation = reducer::reduce(StateField::Validation, next.validation, verdict);
        }
        if let Some(plan) = plan {
            next.plan = reducer::reduce(StateField::Plan, next.plan, plan);
        }
        if let Some(results) = search_results {
            next.search_results =
                reducer::reduce(StateField::SearchResults, next.search_results, results);
        }
        if let Some(report) = report {
            next.report = reducer::reduce(StateField::Report, next.report, report);
        }
        if let Some(metadata) = run_metadata {
            next.run_metadata =
                reducer::reduce(StateField::RunMetadata, next.run_metadata, metadata);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::workflow::state::schema::STATE_SCHEMA;

    fn hit(n: u32) -> SearchResult {
        SearchResult {
            title: format!("title {}", n),
            url: format!("https://example.com/{}", n),
            content: format!("content {}", n),
            score: 1.0 / f64::from(n),
        }
    }

    fn results(update: Vec<SearchResult>) -> StateUpdate {
        StateUpdate {
            search_results: Some(update),
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state_matches_schema_defaults() {
        let state = ResearchState::new("What is photosynthesis?");
        let json = serde_json::to_value(&state).unwrap();

        for def in &STATE_SCHEMA.fields {
            match &def.default {
                Some(default) if def.field == StateField::RunMetadata => {
                    assert_eq!(json[def.field.name()]["steps"], default["steps"]);
                }
                Some(default) => assert_eq!(&json[def.field.name()], default),
                None if def.required => assert!(json[def.field.name()].is_string()),
                None => assert!(json[def.field.name()].is_null()),
            }
        }
        assert_eq!(state.question(), "What is photosynthesis?");
        assert!(state.run_metadata().end_time.is_none());
    }

    #[test]
    fn test_empty_update_is_identity() {
        let state = ResearchState::new("q").apply(results(vec![hit(1)]));
        let applied = state.clone().apply(StateUpdate::default());
        assert_eq!(applied, state);
        assert!(StateUpdate::default().is_empty());
    }

    #[test]
    fn test_search_results_append_in_order() {
        let state = ResearchState::new("q");
        let (a, b) = (vec![hit(1), hit(2)], vec![hit(3)]);

        let state = state.apply(results(a.clone())).apply(results(b.clone()));

        let expected: Vec<_> = a.into_iter().chain(b).collect();
        assert_eq!(state.search_results(), expected.as_slice());
    }

    #[test]
    fn test_search_results_never_deduplicated() {
        let state = ResearchState::new("q")
            .apply(results(vec![hit(1)]))
            .apply(results(vec![hit(1)]));
        assert_eq!(state.search_results().len(), 2);
    }

    #[test]
    fn test_is_valid_question_reducer() {
        let state = ResearchState::new("q");
        let rejected = state.apply(StateUpdate {
            is_valid_question: Some(Some(false)),
            ..Default::default()
        });
        assert!(!rejected.is_valid_question());

        let reset = rejected.apply(StateUpdate {
            is_valid_question: Some(None),
            ..Default::default()
        });
        assert!(reset.is_valid_question());
    }

    #[test]
    fn test_plan_and_report_last_write_wins() {
        let plan = |q: &str| Plan {
            queries: vec![q.to_string()],
            reasoning: "r".to_string(),
        };
        let state = ResearchState::new("q")
            .apply(StateUpdate {
                plan: Some(plan("first")),
                report: Some("draft".to_string()),
                ..Default::default()
            })
            .apply(StateUpdate {
                plan: Some(plan("second")),
                report: Some("final".to_string()),
                ..Default::default()
            });

        assert_eq!(state.plan(), Some(&plan("second")));
        assert_eq!(state.report(), Some("final"));
    }

    #[test]
    fn test_steps_append_through_updates() {
        let state = ResearchState::new("q")
            .apply(StateUpdate {
                run_metadata: Some(MetadataUpdate::step("validate")),
                ..Default::default()
            })
            .apply(StateUpdate {
                run_metadata: Some(MetadataUpdate::step("plan")),
                ..Default::default()
            });
        assert_eq!(state.run_metadata().steps, vec!["validate", "plan"]);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let base = ResearchState::new("q");
        let updates = vec![
            StateUpdate {
                is_valid_question: Some(Some(true)),
                run_metadata: Some(MetadataUpdate::step("validate")),
                ..Default::default()
            },
            results(vec![hit(1), hit(2)]),
            StateUpdate {
                report: Some("done [1]".to_string()),
                run_metadata: Some(MetadataUpdate::finished(
                    "synthesize",
                    base.run_metadata().start_time,
                )),
                ..Default::default()
            },
        ];

        let apply = <ResearchState as GraphState>::apply;
        let first = updates.iter().cloned().fold(base.clone(), apply);
        let second = updates.into_iter().fold(base, apply);
        assert_eq!(first, second);
    }

    #[test]
    fn test_update_fields() {
        let update = StateUpdate {
            plan: Some(Plan {
                queries: vec![],
                reasoning: String::new(),
            }),
            run_metadata: Some(MetadataUpdate::step("plan")),
            ..Default::default()
        };
        assert_eq!(
            update.fields(),
            vec![StateField::Plan, StateField::RunMetadata]
        );
    }

    #[test]
    fn test_summary_for_rejected_question() {
        let state = ResearchState::new("asdfghjkl").apply(StateUpdate {
            is_valid_question: Some(Some(false)),
            validation: Some(ValidationVerdict {
                valid: false,
                reason: "not a question".to_string(),
                suggestion: Some("Ask about a topic".to_string()),
            }),
            ..Default::default()
        });

        let summary = state.summary();
        assert!(summary.contains("rejected: not a question"));
        assert!(summary.contains("Try instead: Ask about a topic"));
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(ResearchState::new("q")).unwrap();
        assert!(json.get("isValidQuestion").is_some());
        assert!(json.get("searchResults").is_some());
        assert!(json["runMetadata"].get("startTime").is_some());
        assert!(json["runMetadata"].get("runId").is_some());
    }
}
