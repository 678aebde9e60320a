//! Flat key listings: dotted label paths under `key` containers and the
//! `keyText` blocks used for page highlighting.

use serde::Serialize;
use serde_json::Value;

use crate::schema::{Node, NodeType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEntry {
    /// Ancestor labels joined with `.`.
    pub label: String,
    pub value: String,
    pub qualifier_parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub page_id: Option<String>,
    pub pos: Option<Value>,
}

/// Every node below `nodes`, pre-order, labelled by its dotted path.
pub fn parse_key_nodes(nodes: &[Node], parent_label: Option<&str>) -> Vec<KeyEntry> {
    let mut keys = Vec::new();
    collect_key_nodes(nodes, parent_label, &mut keys);
    keys
}

fn collect_key_nodes(nodes: &[Node], parent_label: Option<&str>, keys: &mut Vec<KeyEntry>) {
    for node in nodes {
        let label = match parent_label {
            Some(parent) if !parent.is_empty() => format!("{}.{}", parent, node.label),
            _ => node.label.clone(),
        };
        keys.push(KeyEntry {
            label: label.clone(),
            value: node.title(None),
            qualifier_parent: node.qualifier_parent.clone(),
            document_id: None,
        });
        collect_key_nodes(&node.children, Some(&label), keys);
    }
}

/// Key entries of every `key` container, stamped with the enclosing document.
pub fn parse_keys(nodes: &[Node]) -> Vec<KeyEntry> {
    let mut keys = Vec::new();
    collect_keys(nodes, None, &mut keys);
    keys
}

fn collect_keys(nodes: &[Node], document_id: Option<&str>, keys: &mut Vec<KeyEntry>) {
    for node in nodes {
        let document_id = match node.node_type {
            NodeType::Document => Some(node.id.as_str()),
            _ => document_id,
        };
        if node.node_type == NodeType::Key {
            keys.extend(
                parse_key_nodes(&node.children, None)
                    .into_iter()
                    .map(|entry| KeyEntry {
                        document_id: document_id.map(str::to_string),
                        ..entry
                    }),
            );
        } else {
            collect_keys(&node.children, document_id, keys);
        }
    }
}

/// Position of every `keyText` node.
pub fn parse_key_blocks(nodes: &[Node]) -> Vec<KeyBlock> {
    let mut blocks = Vec::new();
    collect_key_blocks(nodes, None, &mut blocks);
    blocks
}

fn collect_key_blocks(nodes: &[Node], document_id: Option<&str>, blocks: &mut Vec<KeyBlock>) {
    for node in nodes {
        let document_id = match node.node_type {
            NodeType::Document => Some(node.id.as_str()),
            _ => document_id,
        };
        if node.node_type == NodeType::KeyText {
            blocks.push(KeyBlock {
                document_id: document_id.map(str::to_string),
                page_id: node.page_id.clone(),
                pos: node.position.clone(),
            });
        }
        collect_key_blocks(&node.children, document_id, blocks);
    }
}

/// Find a key definition item by id among `items` and their `compoundItems`.
pub fn key_item_by_id<'a>(items: &'a [Value], id: &str) -> Option<&'a Value> {
    items
        .iter()
        .flat_map(|item| {
            let compound = item
                .get("compoundItems")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            std::iter::once(item).chain(compound)
        })
        .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
}
