//! BFS over a built graph.

use std::collections::{HashMap, VecDeque};

use super::KnowledgeGraph;

/// Hop distance from `root` to every node reachable from it.
///
/// Nodes not reachable from `root` are absent from the map.
pub fn depths_from(graph: &KnowledgeGraph, root: &str) -> HashMap<String, usize> {
    let mut depths = HashMap::new();
    let Some(root) = graph.canonical(root) else {
        return depths;
    };

    let mut queue = VecDeque::new();
    queue.push_back((root.to_string(), 0));
    depths.insert(root.to_string(), 0);

    while let Some((node, depth)) = queue.pop_front() {
        for edge in graph.edges_from(&node) {
            if !depths.contains_key(&edge.object) {
                depths.insert(edge.object.clone(), depth + 1);
                queue.push_back((edge.object.clone(), depth + 1));
            }
        }
    }

    depths
}
