//! Key classification inside a document.
//!
//! Key-detail nodes found under a document's `key` containers are split by
//! two flags: `is_profile_key_found` and `is_pure_autoextraction`.
//!
//! | found | pure auto | placement                |
//! |-------|-----------|--------------------------|
//! | true  | true      | stays in place           |
//! | false | true      | Auto Extraction Keys     |
//! | false | false     | Process Keys             |
//! | true  | false     | stays in place           |

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::schema::{Node, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGroup {
    /// Left as an ordinary sibling.
    InPlace,
    AutoExtraction,
    ProcessKeys,
}

impl KeyGroup {
    pub fn classify(node: &Node) -> Self {
        let found = node.is_profile_key_found == Some(true);
        let pure_auto = node.is_pure_autoextraction == Some(true);
        match (found, pure_auto) {
            (false, true) => Self::AutoExtraction,
            (false, false) => Self::ProcessKeys,
            (true, _) => Self::InPlace,
        }
    }
}

/// Result of splitting one document's keys.
#[derive(Debug, Default)]
pub struct KeyPartition<'n> {
    /// Discovery order.
    pub auto_extraction: Vec<&'n Node>,
    /// Sorted by label.
    pub process_keys: Vec<&'n Node>,
}

impl<'n> KeyPartition<'n> {
    /// Ids pulled out of the hierarchy into a synthetic group.
    pub fn grouped_ids(&self) -> HashSet<&'n str> {
        self.auto_extraction
            .iter()
            .chain(self.process_keys.iter())
            .map(|n| n.id.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.auto_extraction.is_empty() && self.process_keys.is_empty()
    }
}

/// Collect the outermost categorizable nodes below the `key` containers in
/// `children`. A categorizable node's own descendants are never collected,
/// and nodes listed in `excluded` are treated as already removed.
pub fn collect_categorizable<'n>(children: &'n [Node], excluded: &HashSet<&str>) -> Vec<&'n Node> {
    let mut found = Vec::new();
    for node in children {
        if node.node_type == NodeType::Key && !excluded.contains(node.id.as_str()) {
            search_key(node, excluded, &mut found);
        }
    }
    found
}

fn search_key<'n>(node: &'n Node, excluded: &HashSet<&str>, found: &mut Vec<&'n Node>) {
    if node.node_type.is_table_part() {
        return;
    }
    if node.node_type.is_categorizable() {
        found.push(node);
        return;
    }
    for child in &node.children {
        if !excluded.contains(child.id.as_str()) {
            search_key(child, excluded, found);
        }
    }
}

/// Split a document's keys into the two synthetic groups.
pub fn partition_keys<'n>(children: &'n [Node], excluded: &HashSet<&str>) -> KeyPartition<'n> {
    let mut partition = KeyPartition::default();
    for node in collect_categorizable(children, excluded) {
        match KeyGroup::classify(node) {
            KeyGroup::AutoExtraction => partition.auto_extraction.push(node),
            KeyGroup::ProcessKeys => partition.process_keys.push(node),
            KeyGroup::InPlace => {}
        }
    }
    partition.process_keys.sort_by(|a, b| compare_labels(&a.label, &b.label));
    partition
}

/// Alphabetical, ignoring case; ties fall back to the raw label.
fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
