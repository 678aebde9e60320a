//! Table extraction: `table` nodes become row maps keyed by cell label.

use indexmap::IndexMap;

use serde::Serialize;
use serde_json::Value;

use crate::schema::{Node, NodeType};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableCell {
    pub id: String,
    pub v: String,
    #[serde(rename = "pageId", skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<Value>,
    #[serde(rename = "STATUS", skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(rename = "cellRange", skip_serializing_if = "Option::is_none")]
    pub cell_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worksheet_name: Option<String>,
    pub is_profile_key_found: bool,
    pub is_label_mapped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_key_label: Option<String>,
    pub is_column_mapped_to_key: bool,
}

impl TableCell {
    fn from_node(cell: &Node) -> Self {
        Self {
            id: cell.id.clone(),
            v: cell.value.clone(),
            page_id: cell.page_id.clone(),
            pos: cell.position.clone(),
            status: cell.status.clone(),
            cell_range: cell.cell_range.clone(),
            worksheet_name: cell.worksheet_name.clone(),
            is_profile_key_found: cell.is_profile_key_found.unwrap_or(false),
            is_label_mapped: cell.is_label_mapped.unwrap_or(false),
            original_key_label: cell.original_key_label.clone().filter(|l| !l.is_empty()),
            is_column_mapped_to_key: cell.is_column_mapped_to_key.unwrap_or(false),
        }
    }
}

/// Cells keyed by label, in document order.
pub type TableRow = IndexMap<String, TableCell>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_unique_id: Option<Value>,
    pub table_name: String,
    pub table_id: Value,
    #[serde(rename = "documentId", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub rows: Vec<TableRow>,
}

/// Every `table` node in the tree, tagged with its enclosing document.
/// Tables nested inside another table are not searched.
pub fn parse_tables(nodes: &[Node]) -> Vec<Table> {
    let mut tables = Vec::new();
    collect_tables(nodes, None, &mut tables);
    tables
}

fn collect_tables(nodes: &[Node], document_id: Option<&str>, tables: &mut Vec<Table>) {
    for node in nodes {
        if node.node_type == NodeType::Table {
            tables.push(parse_table(node, document_id));
            continue;
        }
        let document_id = match node.node_type {
            NodeType::Document => Some(node.id.as_str()),
            _ => document_id,
        };
        collect_tables(&node.children, document_id, tables);
    }
}

fn parse_table(table: &Node, document_id: Option<&str>) -> Table {
    let rows = table
        .children
        .iter()
        .filter(|n| n.node_type == NodeType::Row)
        .map(|row| {
            row.children
                .iter()
                .filter(|n| n.node_type == NodeType::Cell && !n.label.is_empty())
                .map(|cell| (cell.label.clone(), TableCell::from_node(cell)))
                .collect()
        })
        .collect();

    Table {
        id: table.id.clone(),
        table_unique_id: table.table_unique_id.clone(),
        table_name: table.table_name.clone().unwrap_or_default(),
        table_id: table.table_id.clone().unwrap_or_else(|| Value::from(0)),
        document_id: document_id.map(str::to_string),
        rows,
    }
}
