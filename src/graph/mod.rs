//! Knowledge graph module: the labeled digraph, its construction and export.
//!
//! Nodes are keyed by label through a [`NodeKeyPolicy`]; at most one edge
//! exists per (subject, object) pair.

pub mod builder;
pub mod export;
mod traversal;

pub use builder::{BuildOptions, BuildOutcome, BuildStats, DiscoveredRelations, GraphBuilder};
pub use export::{GraphDocument, GraphSink, JsonFileSink};
pub use traversal::depths_from;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How a label maps to a node identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKeyPolicy {
    /// Byte-for-byte label equality
    #[default]
    ExactLabel,
    /// Trimmed, lowercased, inner whitespace collapsed
    Normalized,
}

impl NodeKeyPolicy {
    pub fn key(&self, label: &str) -> String {
        match self {
            NodeKeyPolicy::ExactLabel => label.to_string(),
            NodeKeyPolicy::Normalized => label
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
        }
    }
}

/// How objects are produced for a (subject, relation) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStrategy {
    /// One generation with the relation label
    #[default]
    Direct,
    /// One generation per relation phrasing; keep objects enough phrasings agree on
    Consensus,
}

/// A single edge in the knowledge graph (subject --relation--> object).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    key_policy: NodeKeyPolicy,
    /// Display labels in insertion order; the first label seen for a key wins
    nodes: Vec<String>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashSet<(usize, usize)>,
}

impl KnowledgeGraph {
    pub fn new(key_policy: NodeKeyPolicy) -> Self {
        Self {
            key_policy,
            ..Self::default()
        }
    }

    fn index_of(&self, label: &str) -> Option<usize> {
        self.node_index.get(&self.key_policy.key(label)).copied()
    }

    fn ensure_node(&mut self, label: &str) -> usize {
        let key = self.key_policy.key(label);
        if let Some(&idx) = self.node_index.get(&key) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(label.to_string());
        self.node_index.insert(key, idx);
        idx
    }

    /// Add a node; returns false if it already existed
    pub fn add_node(&mut self, label: &str) -> bool {
        if self.has_node(label) {
            return false;
        }
        self.ensure_node(label);
        true
    }

    pub fn has_node(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    /// Stored display label for whatever node `label` maps to
    pub fn canonical(&self, label: &str) -> Option<&str> {
        self.index_of(label).map(|idx| self.nodes[idx].as_str())
    }

    pub fn has_edge(&self, subject: &str, object: &str) -> bool {
        match (self.index_of(subject), self.index_of(object)) {
            (Some(s), Some(o)) => self.edge_index.contains(&(s, o)),
            _ => false,
        }
    }

    /// Add `subject --relation--> object`, creating missing nodes.
    ///
    /// Returns false and changes nothing if the pair is already connected.
    pub fn add_edge(&mut self, subject: &str, object: &str, relation: &str) -> bool {
        if self.has_edge(subject, object) {
            return false;
        }
        let s = self.ensure_node(subject);
        let o = self.ensure_node(object);
        self.edge_index.insert((s, o));
        self.edges.push(Edge {
            subject: self.nodes[s].clone(),
            relation: relation.to_string(),
            object: self.nodes[o].clone(),
        });
        true
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges of a node
    pub fn edges_from<'a>(&'a self, subject: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        let subject = self.canonical(subject).map(str::to_string);
        self.edges
            .iter()
            .filter(move |e| Some(e.subject.as_str()) == subject.as_deref())
    }
}
