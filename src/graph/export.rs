//! Handing the finished graph to a consumer.

use crate::error::Result;
use crate::graph::{Edge, KnowledgeGraph};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serializable snapshot of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub run_id: String,
    pub generated_at: String,
    pub root: String,
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    pub fn new(graph: &KnowledgeGraph, root: &str) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            root: root.to_string(),
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
        }
    }
}

/// Consumer of a finished graph
pub trait GraphSink {
    fn write(&self, graph: &KnowledgeGraph, root: &str) -> Result<()>;
}

/// Writes the graph as pretty-printed JSON
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl GraphSink for JsonFileSink {
    fn write(&self, graph: &KnowledgeGraph, root: &str) -> Result<()> {
        let document = GraphDocument::new(graph, root);
        let json = serde_json::to_string_pretty(&document)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        log::info!(
            "Graph saved to {} ({} nodes, {} edges)",
            self.path.display(),
            document.nodes.len(),
            document.edges.len()
        );
        Ok(())
    }
}
