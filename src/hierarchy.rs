//! Builds a `root → batch → nodes` tree from a flat transaction payload.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::schema::{Node, NodeType, VendorInfo, VendorRef};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPayload {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub profile: Option<Value>,
    #[serde(default)]
    pub batches: Option<Vec<BatchPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub profile: Option<Value>,
    #[serde(default)]
    pub sub_path: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub document_types: Option<String>,
    #[serde(default)]
    pub data_json: Option<BatchData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchData {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Wrap a transaction's batches under a single `root` node. Top-level
/// documents of each batch are stamped with the batch id and vendor name.
pub fn transaction_hierarchy(payload: &TransactionPayload) -> Vec<Node> {
    let Some(batches) = &payload.batches else {
        return Vec::new();
    };

    let children: Vec<Node> = batches.iter().map(batch_node).collect();
    debug!(
        "Built hierarchy for transaction '{}' with {} batch(es)",
        payload.transaction_id,
        children.len()
    );

    vec![Node {
        profile: payload.profile.clone(),
        children,
        ..Node::new(payload.transaction_id.clone(), NodeType::Root)
    }]
}

fn batch_node(batch: &BatchPayload) -> Node {
    let vendor_name = batch.vendor.clone().unwrap_or_default();
    let children = batch
        .data_json
        .as_ref()
        .map(|data| {
            data.nodes
                .iter()
                .map(|node| match node.node_type {
                    NodeType::Document => Node {
                        batch_id: Some(batch.id.clone()),
                        vendor: Some(VendorRef::Info(VendorInfo {
                            vendor: Some(vendor_name.clone()),
                            ..VendorInfo::default()
                        })),
                        ..node.clone()
                    },
                    _ => node.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Node {
        profile: batch.profile.clone(),
        sub_path: batch.sub_path.clone(),
        vendor: Some(VendorRef::Name(vendor_name)),
        document_types: Some(batch.document_types.clone().unwrap_or_default()),
        children,
        ..Node::new(batch.id.clone(), NodeType::Batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> TransactionPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_builds_root_batch_documents() {
        let p = payload(json!({
            "transaction_id": "T1",
            "profile": {"name": "p"},
            "batches": [
                {"id": "B1", "vendor": "ACME", "sub_path": "in", "document_types": "Invoice", "data_json": {"nodes": [
                    {"id": "B1.D1", "type": "document"},
                    {"id": "B1.P", "type": "page"}
                ]}},
                {"id": "B2"}
            ]
        }));

        let tree = transaction_hierarchy(&p);
        assert_eq!(tree.len(), 1);
        let root = &tree[0];
        assert_eq!(root.node_type, NodeType::Root);
        assert_eq!(root.id, "T1");
        assert_eq!(root.profile, Some(json!({"name": "p"})));

        let b1 = &root.children[0];
        assert_eq!(b1.node_type, NodeType::Batch);
        assert_eq!(b1.vendor, Some(VendorRef::Name("ACME".to_string())));
        assert_eq!(b1.sub_path.as_deref(), Some("in"));
        assert_eq!(b1.batch_document_type(), "Invoice");

        let doc = &b1.children[0];
        assert_eq!(doc.batch_id.as_deref(), Some("B1"));
        let info = doc.vendor.as_ref().and_then(VendorRef::info).unwrap();
        assert_eq!(info.vendor.as_deref(), Some("ACME"));
        assert_eq!(b1.children[1].batch_id, None);

        let b2 = &root.children[1];
        assert!(b2.children.is_empty());
        assert_eq!(b2.vendor, Some(VendorRef::Name(String::new())));
    }

    #[test]
    fn test_missing_batches_yield_empty_tree() {
        assert!(transaction_hierarchy(&payload(json!({"transaction_id": "T1"}))).is_empty());
        assert!(transaction_hierarchy(&TransactionPayload::default()).is_empty());
    }
}
