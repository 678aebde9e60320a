//! Text search over word nodes and bulk expansion by node type.

use std::collections::HashSet;

use serde::Serialize;

use crate::schema::{Node, NodeType};

/// Ids the viewer should expand and highlight for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Ancestor chains of every match plus the matches, first occurrence order.
    pub expanded_ids: Vec<String>,
    pub matched_ids: Vec<String>,
}

/// Case-insensitive substring search against `word`/`words` values.
pub fn search_nodes(nodes: &[Node], query: &str) -> SearchResult {
    let needle = query.to_lowercase();
    let mut expanded = Vec::new();
    let mut matched_ids = Vec::new();
    let mut ancestors = Vec::new();

    collect_matching(nodes, &mut ancestors, &mut expanded, &mut |node| {
        let hit = node.node_type.is_word() && node.value.to_lowercase().contains(&needle);
        if hit {
            matched_ids.push(node.id.clone());
        }
        hit
    });

    SearchResult {
        expanded_ids: dedup_in_order(expanded),
        matched_ids,
    }
}

/// Ids (with their ancestor chains) of every node whose type is in `types`.
pub fn expand_nodes_by_type(nodes: &[Node], types: &[NodeType]) -> Vec<String> {
    let mut expanded = Vec::new();
    let mut ancestors = Vec::new();
    collect_matching(nodes, &mut ancestors, &mut expanded, &mut |node| {
        types.contains(&node.node_type)
    });
    dedup_in_order(expanded)
}

fn collect_matching<'n, F>(
    nodes: &'n [Node],
    ancestors: &mut Vec<&'n str>,
    expanded: &mut Vec<String>,
    is_match: &mut F,
) where
    F: FnMut(&Node) -> bool,
{
    for node in nodes {
        if is_match(node) {
            expanded.extend(ancestors.iter().map(|id| id.to_string()));
            expanded.push(node.id.clone());
        }
        if !node.children.is_empty() {
            ancestors.push(&node.id);
            collect_matching(&node.children, ancestors, expanded, is_match);
            ancestors.pop();
        }
    }
}

fn dedup_in_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
