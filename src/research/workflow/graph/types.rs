// SPDX-License-Identifier: MIT

//! Graph workflow type definitions
//!
//! Nodes, edges, routes and the events a run emits.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::adk::error::NodeError;
use crate::research::workflow::state::GraphState;

/// A unit of work in the graph.
///
/// A node reads a snapshot of the state and returns the partial update it
/// wants merged; it never sees or mutates the live state.
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    /// Name the node is registered under
    fn name(&self) -> &str;

    /// Run the node against a snapshot of the state
    async fn run(&self, state: &S) -> Result<S::Update, NodeError>;
}

/// Where an edge leads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A registered node
    Node(String),
    /// The terminal marker; the run ends here
    End,
}

impl Target {
    pub fn node(name: impl Into<String>) -> Self {
        Self::Node(name.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(name) => f.write_str(name),
            Self::End => f.write_str("END"),
        }
    }
}

/// Label a router picks at a branch point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Carry on with the main path
    Continue,
    /// Stop early
    Reject,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Pure function from the post-update state to a route
pub type Router<S> = Arc<dyn Fn(&S) -> Route + Send + Sync>;

/// Outgoing edge of a node
pub enum Edge<S> {
    /// Always go to the same successor
    Direct(Target),
    /// Ask the router; every route has a target, so dispatch cannot miss
    Conditional {
        router: Router<S>,
        on_continue: Target,
        on_reject: Target,
    },
}

impl<S> Edge<S> {
    /// Every target this edge can lead to
    pub fn targets(&self) -> Vec<&Target> {
        match self {
            Self::Direct(to) => vec![to],
            Self::Conditional {
                on_continue,
                on_reject,
                ..
            } => vec![on_continue, on_reject],
        }
    }

    /// Resolve the successor for a state, with the route taken if the edge
    /// is conditional
    pub fn next(&self, state: &S) -> (Option<Route>, &Target) {
        match self {
            Self::Direct(to) => (None, to),
            Self::Conditional {
                router,
                on_continue,
                on_reject,
            } => {
                let route = router(state);
                let to = match route {
                    Route::Continue => on_continue,
                    Route::Reject => on_reject,
                };
                (Some(route), to)
            }
        }
    }
}

impl<S> fmt::Debug for Edge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Self::Conditional {
                on_continue,
                on_reject,
                ..
            } => f
                .debug_struct("Conditional")
                .field("on_continue", on_continue)
                .field("on_reject", on_reject)
                .finish_non_exhaustive(),
        }
    }
}

/// Progress of a run, emitted by `CompiledGraph::run_stream`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GraphEvent {
    NodeStarted {
        node: String,
    },
    NodeCompleted {
        node: String,
        elapsed_ms: u64,
    },
    Routed {
        from: String,
        route: Route,
        to: String,
    },
    Finished,
    Failed {
        node: Option<String>,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone)]
    struct Flag(bool);

    #[test]
    fn test_direct_edge_next() {
        let edge: Edge<Flag> = Edge::Direct(Target::node("search"));
        let (route, to) = edge.next(&Flag(true));
        assert!(route.is_none());
        assert_eq!(to, &Target::node("search"));
    }

    #[test]
    fn test_conditional_edge_dispatch() {
        let edge: Edge<Flag> = Edge::Conditional {
            router: Arc::new(|s: &Flag| if s.0 { Route::Continue } else { Route::Reject }),
            on_continue: Target::node("plan"),
            on_reject: Target::End,
        };

        assert_eq!(
            edge.next(&Flag(true)),
            (Some(Route::Continue), &Target::node("plan"))
        );
        assert_eq!(edge.next(&Flag(false)), (Some(Route::Reject), &Target::End));
        assert_eq!(edge.targets().len(), 2);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::node("plan").to_string(), "plan");
        assert_eq!(Target::End.to_string(), "END");
    }

    #[test]
    fn test_event_serialization() {
        let event = GraphEvent::Routed {
            from: "validate".to_string(),
            route: Route::Reject,
            to: "END".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "routed", "from": "validate", "route": "reject", "to": "END"})
        );
        assert_eq!(
            serde_json::to_value(GraphEvent::Finished).unwrap(),
            json!({"event": "finished"})
        );
    }
}
