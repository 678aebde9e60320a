//! Display records emitted by the flattener.

use std::collections::{BTreeMap, HashMap};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::schema::Node;

/// Badge colour derived from a node's numeric `STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeVariant {
    Info,
    Danger,
    Warning,
    Success,
    Secondary,
    Dark,
    Primary,
    #[default]
    None,
}

impl BadgeVariant {
    pub fn from_status(status: i64) -> Self {
        match status {
            0 => Self::Info,
            -2 => Self::Danger,
            -1 => Self::Warning,
            1 => Self::Success,
            2 => Self::Secondary,
            200 => Self::Dark,
            111 => Self::Primary,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Secondary => "secondary",
            Self::Dark => "dark",
            Self::Primary => "primary",
            Self::None => "",
        }
    }
}

impl Serialize for BadgeVariant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-record action offered by the tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeOption {
    #[serde(rename = "rules")]
    Rules,
    #[serde(rename = "notInUse")]
    NotInUse,
    #[serde(rename = "lookup")]
    Lookup,
    #[serde(rename = "addToDB")]
    AddToDb,
    // Wire name is fixed by the consuming UI.
    #[serde(rename = "hideEmptyAutoExtrationKeys")]
    HideEmptyAutoExtractionKeys,
}

/// Master-table insert derived from an address block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToDbData {
    pub record: BTreeMap<String, String>,
    pub table_name: String,
}

/// Fields copied from an address block into its master-table record.
const ADDRESS_FIELDS: [&str; 4] = ["name", "addressLine1", "addressLine2", "city"];

impl AddToDbData {
    /// Build the `{PREFIX}{FIELD}` record for an address block node.
    pub fn from_node(node: &Node, nested_label: &str) -> Self {
        let details: HashMap<&str, String> = node
            .children
            .iter()
            .map(|child| (child.label(), child.title(None)))
            .collect();

        let prefix = nested_label.to_uppercase();
        let record = ADDRESS_FIELDS
            .iter()
            .filter_map(|field| {
                details
                    .get(field)
                    .filter(|value| !value.is_empty())
                    .map(|value| (format!("{}{}", prefix, field.to_uppercase()), value.clone()))
            })
            .collect();

        Self {
            record,
            table_name: format!("{}_MASTER", prefix),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigData {
    pub options: Vec<NodeOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_to_db_data: Option<AddToDbData>,
}

impl ConfigData {
    pub fn with_options(options: Vec<NodeOption>) -> Self {
        Self {
            options,
            add_to_db_data: None,
        }
    }

    /// Options for a node addressed by its dotted label path.
    ///
    /// Nodes without a label path get no options. `lookup` is offered only to
    /// leaves outside a `references` qualifier; `addToDB` only to address
    /// blocks on the allow-list.
    pub fn for_node(node: &Node, nested_label: Option<&str>, address_block_keys: &[String]) -> Self {
        let Some(nested_label) = nested_label else {
            return Self::default();
        };

        let mut options = vec![NodeOption::Rules, NodeOption::NotInUse];
        if node.qualifier_parent.as_deref() != Some("references") && node.children.is_empty() {
            options.push(NodeOption::Lookup);
        }

        let mut add_to_db_data = None;
        if address_block_keys.iter().any(|k| k == nested_label) {
            options.push(NodeOption::AddToDb);
            add_to_db_data = Some(AddToDbData::from_node(node, nested_label));
        }

        Self {
            options,
            add_to_db_data,
        }
    }
}

/// One row of the flattened tree view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    pub id: String,
    pub node_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub depth: usize,
    pub draggable: bool,
    pub draggable_target: bool,
    pub expandable: bool,
    pub expanded: bool,
    pub highlighted: bool,
    pub search_match: bool,
    pub badge_variant: BadgeVariant,
    pub nested_label: Option<String>,
    pub key_id: Option<String>,
    pub config_data: ConfigData,

    pub transaction_id: Option<String>,
    pub batch_id: Option<String>,
    pub current_batch_id: Option<String>,
    pub document_id: Option<String>,
    pub parent_node_id: Option<String>,

    pub is_profile_key_found: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_auto_extracted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_label_mapped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_key_from_table: Option<bool>,
    #[serde(rename = "OriginalKeyLabel", skip_serializing_if = "Option::is_none")]
    pub original_key_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier_parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_data_exception_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pure_autoextraction: Option<bool>,
    pub is_address_block_partial: bool,
    #[serde(rename = "Status")]
    pub status: Value,
    pub not_in_use: bool,

    /// `batch` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    /// `document` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    /// `document` only: every non-table key label below the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_keys: Option<Vec<String>>,
    /// `vendor` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_badge_from_status() {
        assert_eq!(BadgeVariant::from_status(0), BadgeVariant::Info);
        assert_eq!(BadgeVariant::from_status(-2), BadgeVariant::Danger);
        assert_eq!(BadgeVariant::from_status(-1), BadgeVariant::Warning);
        assert_eq!(BadgeVariant::from_status(1), BadgeVariant::Success);
        assert_eq!(BadgeVariant::from_status(2), BadgeVariant::Secondary);
        assert_eq!(BadgeVariant::from_status(200), BadgeVariant::Dark);
        assert_eq!(BadgeVariant::from_status(111), BadgeVariant::Primary);
        assert_eq!(BadgeVariant::from_status(-1000).as_str(), "");
    }

    #[test]
    fn test_config_without_nested_label() {
        let n = node(json!({"id": "a", "type": "key_detail"}));
        assert!(ConfigData::for_node(&n, None, &[]).options.is_empty());
    }

    #[test]
    fn test_lookup_only_for_leaves_outside_references() {
        let leaf = node(json!({"id": "a", "type": "keyTextDetail", "label": "city"}));
        let config = ConfigData::for_node(&leaf, Some("shipper.city"), &[]);
        assert_eq!(config.options, vec![NodeOption::Rules, NodeOption::NotInUse, NodeOption::Lookup]);

        let referenced = node(json!({"id": "b", "type": "keyTextDetail", "qualifierParent": "references"}));
        let config = ConfigData::for_node(&referenced, Some("ref"), &[]);
        assert_eq!(config.options, vec![NodeOption::Rules, NodeOption::NotInUse]);

        let parent = node(json!({"id": "c", "type": "key_detail", "children": [{"id": "c.1", "type": "keyTextDetail"}]}));
        let config = ConfigData::for_node(&parent, Some("shipper"), &[]);
        assert!(!config.options.contains(&NodeOption::Lookup));
    }

    #[test]
    fn test_address_block_add_to_db() {
        let block = node(json!({
            "id": "s", "type": "key_detail", "label": "shipper",
            "children": [
                {"id": "s.1", "type": "keyTextDetail", "label": "name", "v": "ACME"},
                {"id": "s.2", "type": "keyTextDetail", "label": "addressLine1", "v": "1 Main St"},
                {"id": "s.3", "type": "keyTextDetail", "label": "addressLine2", "v": ""},
                {"id": "s.4", "type": "keyTextDetail", "label": "zip", "v": "78701"}
            ]
        }));
        let config = ConfigData::for_node(&block, Some("shipper"), &["shipper".to_string()]);
        assert_eq!(config.options.last(), Some(&NodeOption::AddToDb));

        let data = config.add_to_db_data.unwrap();
        assert_eq!(data.table_name, "SHIPPER_MASTER");
        assert_eq!(data.record.len(), 2);
        assert_eq!(data.record["SHIPPERNAME"], "ACME");
        assert_eq!(data.record["SHIPPERADDRESSLINE1"], "1 Main St");
    }

    #[test]
    fn test_option_wire_names() {
        let config = ConfigData::with_options(vec![NodeOption::AddToDb, NodeOption::HideEmptyAutoExtractionKeys]);
        let out = serde_json::to_value(&config).unwrap();
        assert_eq!(out, json!({"options": ["addToDB", "hideEmptyAutoExtrationKeys"]}));
    }
}
