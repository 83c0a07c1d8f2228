use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GraphError;

/// A graph node. Only `id` takes part in layout; every other field of the
/// input object is carried through in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            payload: Map::new(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(input: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ensure_node(&mut self, id: &str) {
        if self.nodes.iter().any(|node| node.id == id) {
            return;
        }
        self.nodes.push(Node {
            id: id.to_string(),
            payload: Map::new(),
        });
    }

    /// Adds an edge, creating either endpoint if it does not exist yet.
    pub fn connect(&mut self, source: &str, target: &str) {
        self.ensure_node(source);
        self.ensure_node(target);
        self.edges.push(Edge::new(source, target));
    }

    /// Rejects graphs that reuse a node id.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(())
    }

    /// Indices of edges that reference a node id missing from `nodes`.
    pub fn dangling_edges(&self) -> Vec<usize> {
        let ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| {
                !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str())
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}
