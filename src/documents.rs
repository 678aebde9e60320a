//! Per-document bundles assembled from the independent table, key and key
//! block listings.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::keys::{parse_key_blocks, parse_keys, KeyBlock, KeyEntry};
use crate::schema::{Node, NodeType};
use crate::tables::{parse_tables, Table};

/// A `document` node with its inherited batch and transaction ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub language: Option<String>,
    pub batch_id: String,
    pub transaction_id: Option<String>,
    #[serde(rename = "Vendor")]
    pub vendor: Option<String>,
    pub layout_id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBundle {
    pub language: Option<String>,
    pub tables: Vec<Table>,
    pub key_blocks: Vec<KeyBlock>,
    pub keys: Vec<KeyEntry>,
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<Value>,
}

/// `{transactionId: {batchId: {documentId: bundle}}}`. Documents outside a
/// transaction are filed under the empty string.
pub type DocumentsByTransaction = BTreeMap<String, BTreeMap<String, BTreeMap<String, DocumentBundle>>>;

/// `{batchId: {documentId: bundle}}`.
pub type VerificationDocuments = BTreeMap<String, BTreeMap<String, DocumentBundle>>;

/// Every `document` node in pre-order. Without a `batch` ancestor the batch id
/// is the first two dot-separated segments of the document id.
pub fn parse_documents(nodes: &[Node]) -> Vec<DocumentRecord> {
    let mut documents = Vec::new();
    collect_documents(nodes, None, None, &mut documents);
    documents
}

fn collect_documents<'n>(
    nodes: &'n [Node],
    batch_id: Option<&str>,
    transaction_id: Option<&'n str>,
    documents: &mut Vec<DocumentRecord>,
) {
    for node in nodes {
        let mut batch_id = batch_id.map(str::to_string);
        let mut transaction_id = transaction_id;
        match node.node_type {
            NodeType::Root => transaction_id = Some(node.id.as_str()),
            NodeType::Batch => batch_id = Some(node.id.clone()),
            _ => {}
        }

        if node.node_type == NodeType::Document {
            let derived = batch_id
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| derive_batch_id(&node.id));
            documents.push(DocumentRecord {
                id: node.id.clone(),
                language: node.language.clone(),
                batch_id: derived.clone(),
                transaction_id: transaction_id.map(str::to_string),
                vendor: node.vendor_name.clone(),
                layout_id: node.layout_id.clone(),
            });
            batch_id = Some(derived);
        }

        collect_documents(&node.children, batch_id.as_deref(), transaction_id, documents);
    }
}

fn derive_batch_id(document_id: &str) -> String {
    document_id.split('.').take(2).collect::<Vec<_>>().join(".")
}

/// Source spreadsheet of a sheet-backed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcelData {
    pub file_name: String,
}

/// File name of the spreadsheet behind the tree, taken from its first node.
pub fn excel_data(nodes: &[Node]) -> Option<ExcelData> {
    let first = nodes.first()?;
    Some(ExcelData {
        file_name: format!(
            "{}{}",
            first.source_file_name.as_deref().unwrap_or_default(),
            first.ext.as_deref().unwrap_or_default()
        ),
    })
}

/// Per-document tables, key blocks and keys, indexed by document id.
struct DocumentParts {
    tables: HashMap<String, Vec<Table>>,
    key_blocks: HashMap<String, Vec<KeyBlock>>,
    keys: HashMap<String, Vec<KeyEntry>>,
}

impl DocumentParts {
    fn collect(nodes: &[Node]) -> Self {
        let mut parts = Self {
            tables: HashMap::new(),
            key_blocks: HashMap::new(),
            keys: HashMap::new(),
        };
        for mut table in parse_tables(nodes) {
            if let Some(id) = table.document_id.take() {
                parts.tables.entry(id).or_default().push(table);
            }
        }
        for mut block in parse_key_blocks(nodes) {
            if let Some(id) = block.document_id.take() {
                parts.key_blocks.entry(id).or_default().push(block);
            }
        }
        for mut key in parse_keys(nodes) {
            if let Some(id) = key.document_id.take() {
                parts.keys.entry(id).or_default().push(key);
            }
        }
        parts
    }

    fn bundle(&self, document: &DocumentRecord, with_layout: bool) -> DocumentBundle {
        DocumentBundle {
            language: document.language.clone(),
            tables: self.tables.get(&document.id).cloned().unwrap_or_default(),
            key_blocks: self.key_blocks.get(&document.id).cloned().unwrap_or_default(),
            keys: self.keys.get(&document.id).cloned().unwrap_or_default(),
            vendor: document.vendor.clone().filter(|v| !v.is_empty()),
            layout_id: if with_layout {
                document.layout_id.clone()
            } else {
                None
            },
        }
    }
}

/// Bundles grouped by transaction, then batch.
pub fn documents_by_transaction(nodes: &[Node]) -> DocumentsByTransaction {
    let parts = DocumentParts::collect(nodes);
    let mut grouped = DocumentsByTransaction::new();
    for document in parse_documents(nodes) {
        let bundle = parts.bundle(&document, true);
        grouped
            .entry(document.transaction_id.clone().unwrap_or_default())
            .or_default()
            .entry(document.batch_id.clone())
            .or_default()
            .insert(document.id, bundle);
    }
    debug!("Bundled documents for {} transaction(s)", grouped.len());
    grouped
}

/// Bundles grouped by batch, for the verification view.
pub fn verification_documents(nodes: &[Node]) -> VerificationDocuments {
    let parts = DocumentParts::collect(nodes);
    let mut grouped = VerificationDocuments::new();
    for document in parse_documents(nodes) {
        let bundle = parts.bundle(&document, false);
        grouped
            .entry(document.batch_id.clone())
            .or_default()
            .insert(document.id, bundle);
    }
    grouped
}
