// SPDX-License-Identifier: MIT

//! Graph workflow executor

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use super::types::{Edge, GraphEvent, Node, Target};
use crate::adk::error::ExecutionError;
use crate::research::workflow::state::GraphState;

/// Validated graph ready for execution.
///
/// Built by [`GraphBuilder::compile`](super::GraphBuilder::compile), which
/// guarantees the graph is acyclic and every reachable node leads to the end,
/// so a run visits each node at most once and always terminates.
pub struct CompiledGraph<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: String,
}

impl<S: GraphState> std::fmt::Debug for CompiledGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

impl<S: GraphState> CompiledGraph<S> {
    pub(super) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        edges: HashMap<String, Edge<S>>,
        entry: String,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry,
        }
    }

    /// Node the run starts at
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Run from the entry point to the end
    pub async fn run(&self, state: S) -> Result<S, ExecutionError> {
        self.execute(&self.entry, state, None).await
    }

    /// Run from an explicit node to the end
    pub async fn run_from(&self, entry: &str, state: S) -> Result<S, ExecutionError> {
        self.execute(entry, state, None).await
    }

    /// Run from the entry point, reporting progress on `tx`.
    ///
    /// A closed receiver does not affect the run.
    pub async fn run_stream(
        &self,
        state: S,
        tx: mpsc::Sender<GraphEvent>,
    ) -> Result<S, ExecutionError> {
        self.execute(&self.entry, state, Some(&tx)).await
    }

    async fn execute(
        &self,
        entry: &str,
        mut state: S,
        tx: Option<&mpsc::Sender<GraphEvent>>,
    ) -> Result<S, ExecutionError> {
        let mut current = Target::node(entry);

        while let Target::Node(name) = current {
            // Both lookups happen before the node runs
            let (node, edge) = match (self.nodes.get(&name), self.edges.get(&name)) {
                (Some(node), Some(edge)) => (node, edge),
                (None, _) => {
                    let err = ExecutionError::UnknownNode(name);
                    emit(tx, failed(&err)).await;
                    return Err(err);
                }
                (Some(_), None) => {
                    log::error!("Node {} has no outgoing edge", name);
                    let err = ExecutionError::NoOutgoingEdge(name);
                    emit(tx, failed(&err)).await;
                    return Err(err);
                }
            };

            log::info!("Executing node: {}", name);
            emit(
                tx,
                GraphEvent::NodeStarted {
                    node: name.clone(),
                },
            )
            .await;

            let started = Instant::now();
            let update = match node.run(&state).await {
                Ok(update) => update,
                Err(source) => {
                    log::error!("Node {} failed: {}", name, source);
                    let err = ExecutionError::Node { node: name, source };
                    emit(tx, failed(&err)).await;
                    return Err(err);
                }
            };
            state = state.apply(update);

            let elapsed_ms = started.elapsed().as_millis() as u64;
            log::info!("Node {} completed in {}ms", name, elapsed_ms);
            emit(
                tx,
                GraphEvent::NodeCompleted {
                    node: name.clone(),
                    elapsed_ms,
                },
            )
            .await;

            // Routers see the state with this node's update already merged
            let (route, next) = edge.next(&state);
            if let Some(route) = route {
                log::info!("Router after {} chose {} -> {}", name, route, next);
                emit(
                    tx,
                    GraphEvent::Routed {
                        from: name.clone(),
                        route,
                        to: next.to_string(),
                    },
                )
                .await;
            }
            current = next.clone();
        }

        emit(tx, GraphEvent::Finished).await;
        Ok(state)
    }
}

fn failed(err: &ExecutionError) -> GraphEvent {
    GraphEvent::Failed {
        node: err.node().map(str::to_string),
        message: err.to_string(),
    }
}

async fn emit(tx: Option<&mpsc::Sender<GraphEvent>>, event: GraphEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}
