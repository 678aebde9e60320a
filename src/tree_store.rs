//! In-memory store for uploaded trees, addressed by uuid and deduplicated by
//! content hash.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::schema::Node;

/// Returned when a tree is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSummary {
    pub id: String,
    pub node_count: usize,
    /// SHA-256 of the normalized tree.
    pub hash: String,
}

#[derive(Debug)]
struct StoredTree {
    summary: TreeSummary,
    nodes: Arc<Vec<Node>>,
}

#[derive(Debug, Default)]
struct Inner {
    trees: HashMap<String, StoredTree>,
    by_hash: HashMap<String, String>,
}

/// Trees are immutable once stored; readers share them through `Arc`.
#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    inner: Arc<RwLock<Inner>>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a tree. Uploading identical content again returns the existing id.
    pub fn store(&self, nodes: Vec<Node>) -> TreeSummary {
        let hash = content_hash(&nodes);
        let mut inner = self.inner.write().unwrap();

        if let Some(existing) = inner.by_hash.get(&hash).and_then(|id| inner.trees.get(id)) {
            tracing::debug!("TreeStore: reusing '{}' for hash {}", existing.summary.id, hash);
            return existing.summary.clone();
        }

        let summary = TreeSummary {
            id: Uuid::new_v4().to_string(),
            node_count: count_nodes(&nodes),
            hash: hash.clone(),
        };
        inner.by_hash.insert(hash, summary.id.clone());
        inner.trees.insert(
            summary.id.clone(),
            StoredTree {
                summary: summary.clone(),
                nodes: Arc::new(nodes),
            },
        );
        tracing::debug!("TreeStore: stored '{}' ({} nodes)", summary.id, summary.node_count);
        summary
    }

    pub fn get(&self, id: &str) -> Option<Arc<Vec<Node>>> {
        let inner = self.inner.read().unwrap();
        inner.trees.get(id).map(|tree| Arc::clone(&tree.nodes))
    }

    pub fn summary(&self, id: &str) -> Option<TreeSummary> {
        let inner = self.inner.read().unwrap();
        inner.trees.get(id).map(|tree| tree.summary.clone())
    }

    /// Remove a tree. Returns true if it existed.
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        match inner.trees.remove(id) {
            Some(tree) => {
                inner.by_hash.remove(&tree.summary.hash);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Total number of nodes, descendants included.
pub fn count_nodes(nodes: &[Node]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}

fn content_hash(nodes: &[Node]) -> String {
    let mut hasher = Sha256::new();
    // Serializing plain data structs cannot fail.
    let bytes = serde_json::to_vec(nodes).unwrap_or_default();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}
