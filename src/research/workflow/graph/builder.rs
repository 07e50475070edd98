// SPDX-License-Identifier: MIT

//! Graph builder - registers nodes and edges, validates the wiring and
//! compiles an executable graph

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::executor::CompiledGraph;
use super::types::{Edge, Node, Route, Target};
use crate::adk::error::WorkflowError;
use crate::research::workflow::state::GraphState;

/// Builds a [`CompiledGraph`].
///
/// Registration errors are collected and reported by [`GraphBuilder::compile`],
/// so calls can be chained.
pub struct GraphBuilder<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    node_order: Vec<String>, // Registration order for deterministic validation
    edges: HashMap<String, Edge<S>>,
    entry: Option<String>,
    errors: Vec<WorkflowError>,
}

impl<S: GraphState> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            node_order: Vec::new(),
            edges: HashMap::new(),
            entry: None,
            errors: Vec::new(),
        }
    }

    /// Register a node under its own name
    pub fn add_node(self, node: impl Node<S> + 'static) -> Self {
        self.add_shared_node(Arc::new(node))
    }

    /// Register an already shared node
    pub fn add_shared_node(mut self, node: Arc<dyn Node<S>>) -> Self {
        let name = node.name().to_string();
        if self.nodes.contains_key(&name) {
            self.errors.push(WorkflowError::DuplicateNode(name));
            return self;
        }
        self.node_order.push(name.clone());
        self.nodes.insert(name, node);
        self
    }

    /// Node the run starts at
    pub fn set_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Unconditional edge
    pub fn add_edge(self, from: impl Into<String>, to: Target) -> Self {
        self.insert_edge(from.into(), Edge::Direct(to))
    }

    /// Edge whose successor is picked by `router` after `from` completes
    pub fn add_conditional_edge<R>(
        self,
        from: impl Into<String>,
        router: R,
        on_continue: Target,
        on_reject: Target,
    ) -> Self
    where
        R: Fn(&S) -> Route + Send + Sync + 'static,
    {
        self.insert_edge(
            from.into(),
            Edge::Conditional {
                router: Arc::new(router),
                on_continue,
                on_reject,
            },
        )
    }

    fn insert_edge(mut self, from: String, edge: Edge<S>) -> Self {
        if self.edges.contains_key(&from) {
            self.errors.push(WorkflowError::DuplicateEdge(from));
            return self;
        }
        self.edges.insert(from, edge);
        self
    }

    /// Validate the wiring and produce an executable graph.
    ///
    /// Rejects a missing or unknown entry point, edges touching unregistered
    /// nodes, cycles, and any node reachable from the entry that cannot reach
    /// the end.
    pub fn compile(mut self) -> Result<CompiledGraph<S>, WorkflowError> {
        if let Some(err) = self.errors.drain(..).next() {
            return Err(err);
        }

        let entry = self.entry.clone().ok_or(WorkflowError::MissingEntry)?;
        if !self.nodes.contains_key(&entry) {
            return Err(WorkflowError::UnknownNode(entry));
        }

        self.check_edges()?;
        self.check_cycles()?;

        let reachable = self.reachable_from(&entry);
        for name in &self.node_order {
            if !reachable.contains(name) {
                log::warn!("Node {} is unreachable from entry {}", name, entry);
            } else if !self.edges.contains_key(name) {
                return Err(WorkflowError::NoPathToEnd(name.clone()));
            }
        }

        log::debug!(
            "Compiled graph with {} nodes, entry {}",
            self.nodes.len(),
            entry
        );
        Ok(CompiledGraph::new(self.nodes, self.edges, entry))
    }

    /// Every edge starts and ends at a registered node (or the end)
    fn check_edges(&self) -> Result<(), WorkflowError> {
        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort();

        for from in sources {
            if !self.nodes.contains_key(from) {
                return Err(WorkflowError::UnknownNode(from.clone()));
            }
            for target in self.edges[from].targets() {
                if let Target::Node(to) = target {
                    if !self.nodes.contains_key(to) {
                        return Err(WorkflowError::UnknownNode(to.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    fn successors(&self, name: &str) -> Vec<&str> {
        self.edges
            .get(name)
            .map(|edge| {
                edge.targets()
                    .into_iter()
                    .filter_map(|t| match t {
                        Target::Node(n) => Some(n.as_str()),
                        Target::End => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Depth-first search for a back edge; reports the cycle path
    fn check_cycles(&self) -> Result<(), WorkflowError> {
        let mut done: HashSet<&str> = HashSet::new();

        for start in &self.node_order {
            if done.contains(start.as_str()) {
                continue;
            }

            let mut path: Vec<&str> = Vec::new();
            let mut stack: Vec<(&str, bool)> = vec![(start.as_str(), false)];

            while let Some((name, leaving)) = stack.pop() {
                if leaving {
                    path.pop();
                    done.insert(name);
                    continue;
                }
                if done.contains(name) {
                    continue;
                }
                if let Some(pos) = path.iter().position(|n| *n == name) {
                    let mut cycle: Vec<String> =
                        path[pos..].iter().map(|n| n.to_string()).collect();
                    cycle.push(name.to_string());
                    return Err(WorkflowError::CircularDependency(cycle));
                }

                path.push(name);
                stack.push((name, true));
                for next in self.successors(name).into_iter().rev() {
                    stack.push((next, false));
                }
            }
        }
        Ok(())
    }

    fn reachable_from(&self, entry: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut queue = vec![entry];
        while let Some(name) = queue.pop() {
            if seen.insert(name.to_string()) {
                queue.extend(self.successors(name));
            }
        }
        seen
    }
}

impl<S: GraphState> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
