//! Vendor extraction with enclosing document and batch context.

use serde::Serialize;
use serde_json::Value;

use crate::schema::{Node, NodeType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRecord {
    pub document_id: Option<String>,
    pub batch_id: Option<String>,
    /// Document type of the enclosing batch.
    pub document_type: Option<String>,
    pub vendor: String,
    #[serde(rename = "page_id")]
    pub page_id: String,
    #[serde(rename = "vendor_position")]
    pub vendor_position: Value,
    #[serde(rename = "is_profile_key_found")]
    pub is_profile_key_found: bool,
}

#[derive(Clone, Copy, Default)]
struct Context<'n> {
    document_id: Option<&'n str>,
    batch_id: Option<&'n str>,
    document_type: Option<&'n str>,
}

/// Every `vendor` node in pre-order.
pub fn parse_vendors(nodes: &[Node]) -> Vec<VendorRecord> {
    let mut vendors = Vec::new();
    collect_vendors(nodes, Context::default(), &mut vendors);
    vendors
}

fn collect_vendors<'n>(nodes: &'n [Node], ctx: Context<'n>, vendors: &mut Vec<VendorRecord>) {
    for node in nodes {
        let ctx = match node.node_type {
            NodeType::Document => Context {
                document_id: Some(node.id.as_str()),
                ..ctx
            },
            NodeType::Batch => Context {
                batch_id: Some(node.id.as_str()),
                document_type: Some(node.batch_document_type()),
                ..ctx
            },
            _ => ctx,
        };

        if node.node_type == NodeType::Vendor {
            vendors.push(VendorRecord {
                document_id: ctx.document_id.map(str::to_string),
                batch_id: ctx.batch_id.map(str::to_string),
                document_type: ctx.document_type.map(str::to_string),
                vendor: node.value.clone(),
                page_id: node.page_id.clone().unwrap_or_default(),
                vendor_position: node
                    .position
                    .clone()
                    .unwrap_or_else(|| Value::String(String::new())),
                is_profile_key_found: node.is_profile_key_found != Some(false),
            });
        }

        collect_vendors(&node.children, ctx, vendors);
    }
}
