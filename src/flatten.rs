//! Tree-to-list projection feeding the virtualized tree view.
//!
//! [`flat_nodes`] walks the raw hierarchy depth-first and emits one
//! [`DisplayRecord`] per visible node. `key` containers are unwrapped in place,
//! `document` and `batch` siblings are put in natural-id order, and every
//! expanded document gets a synthetic vendor row plus the Auto Extraction /
//! Process Keys groups. Grouped nodes are hidden from their original position
//! through an id exclusion set instead of a copied hierarchy.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::grouping::partition_keys;
use crate::natural_id::{sort_for_display, SortOrder};
use crate::record::{BadgeVariant, ConfigData, DisplayRecord, NodeOption};
use crate::schema::{Node, NodeType, VendorRef};
use crate::validate::{validate_tree, TreeError};

pub const VENDOR_LABEL: &str = "Document Issuer";
pub const AUTO_EXTRACTION_TITLE: &str = "Auto Extraction Keys";
pub const PROCESS_KEYS_TITLE: &str = "Process Keys";

/// The node the user has selected in the viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SelectedNode {
    pub id: String,
    #[serde(default)]
    pub highlight: bool,
}

/// UI state the projection depends on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewState {
    pub expanded_nodes: HashSet<String>,
    pub matched_nodes: HashSet<String>,
    pub selected_node: Option<SelectedNode>,
    pub highlight_root_nodes: bool,
    pub address_block_keys: Vec<String>,
    pub document_sort_order: SortOrder,
}

/// Context inherited from ancestors while walking.
#[derive(Debug, Clone, Default)]
struct Scope {
    depth: usize,
    nested_label: Option<String>,
    key_id: Option<String>,
    transaction_id: Option<String>,
    parent_node_id: Option<String>,
    draggable: bool,
    draggable_target: bool,
    document_id: Option<String>,
    batch_id: Option<String>,
}

/// Ancestor ids stamped on a document's synthetic rows.
struct Lineage {
    transaction_id: Option<String>,
    batch_id: Option<String>,
    current_batch_id: Option<String>,
    document_id: Option<String>,
}

/// Flatten `nodes` into display order for the given view state.
pub fn flat_nodes(
    nodes: &[Node],
    view: &ViewState,
    max_depth: usize,
) -> Result<Vec<DisplayRecord>, TreeError> {
    validate_tree(nodes, max_depth)?;

    let mut flattener = Flattener {
        view,
        records: Vec::new(),
    };
    let top: Vec<&Node> = nodes.iter().collect();
    flattener.walk(&top, &Scope::default(), &HashSet::new());

    debug!(
        "Flattened {} top-level nodes into {} records ({} expanded ids)",
        nodes.len(),
        flattener.records.len(),
        view.expanded_nodes.len()
    );
    Ok(flattener.records)
}

struct Flattener<'v> {
    view: &'v ViewState,
    records: Vec<DisplayRecord>,
}

impl<'v> Flattener<'v> {
    fn walk<'n>(&mut self, nodes: &[&'n Node], scope: &Scope, excluded: &HashSet<&'n str>) {
        // Lazily loaded subtrees still need an expander at the top level.
        let expandable_types = if scope.depth == 0 {
            expandable_types(nodes, excluded)
        } else {
            HashSet::new()
        };

        let ordered = sort_for_display(nodes, self.view.document_sort_order);
        let indexes = type_indexes(&ordered);

        for (&node, index) in ordered.iter().zip(indexes) {
            if !node.node_type.is_displayable() {
                continue;
            }
            if node.node_type == NodeType::Key {
                let inner = Scope {
                    parent_node_id: Some(node.id.clone()),
                    draggable: false,
                    draggable_target: false,
                    ..scope.clone()
                };
                self.walk(&visible_children(node, excluded), &inner, excluded);
                continue;
            }
            self.emit(node, index, &expandable_types, scope, excluded);
        }
    }

    fn emit<'n>(
        &mut self,
        node: &'n Node,
        index: usize,
        expandable_types: &HashSet<NodeType>,
        scope: &Scope,
        excluded: &HashSet<&'n str>,
    ) {
        let children = visible_children(node, excluded);
        let has_displayable_children = children.iter().any(|c| c.node_type.is_displayable());
        let expandable = (scope.depth == 0 && expandable_types.contains(&node.node_type))
            || has_displayable_children;
        let expanded = expandable && self.view.expanded_nodes.contains(&node.id);

        let transaction_id = match node.node_type {
            NodeType::Root => Some(node.id.clone()),
            _ => scope.transaction_id.clone(),
        };
        let own_batch_id = (node.node_type == NodeType::Batch).then(|| node.id.clone());
        let inherited_batch_id = own_batch_id.clone().or_else(|| scope.batch_id.clone());
        let document_id = match node.node_type {
            NodeType::Document => Some(node.id.clone()),
            _ => scope.document_id.clone(),
        };

        let nested_label = match (node.label.is_empty(), &scope.nested_label) {
            (true, _) => None,
            (false, Some(parent)) => Some(format!("{}.{}", parent, node.label)),
            (false, None) => Some(node.label.clone()),
        };
        let key_id = node.unique_id.clone().or_else(|| scope.key_id.clone());
        let highlighted = self.view.selected_node.as_ref().is_some_and(|selected| {
            selected.highlight && !self.view.highlight_root_nodes && selected.id == node.id
        });

        let lineage = Lineage {
            transaction_id: transaction_id.clone(),
            batch_id: own_batch_id.or_else(|| node.batch_id.clone()),
            current_batch_id: inherited_batch_id.clone(),
            document_id: document_id.clone(),
        };

        let mut record = DisplayRecord {
            id: node.id.clone(),
            node_id: node.id.clone(),
            title: node.title(Some(index)),
            node_type: node.node_type.to_string(),
            label: node.label.clone(),
            depth: scope.depth,
            draggable: scope.draggable,
            draggable_target: scope.draggable_target,
            expandable,
            expanded,
            highlighted,
            search_match: self.view.matched_nodes.contains(&node.id),
            badge_variant: node.badge_variant(),
            config_data: ConfigData::for_node(
                node,
                nested_label.as_deref(),
                &self.view.address_block_keys,
            ),
            nested_label: nested_label.clone(),
            key_id: key_id.clone(),
            transaction_id: lineage.transaction_id.clone(),
            batch_id: lineage.batch_id.clone(),
            current_batch_id: lineage.current_batch_id.clone(),
            document_id: lineage.document_id.clone(),
            parent_node_id: scope.parent_node_id.clone(),
            is_profile_key_found: match node.node_type {
                NodeType::Vendor => Some(true),
                _ => node.is_profile_key_found,
            },
            is_auto_extracted: node.is_auto_extracted,
            is_label_mapped: node.is_label_mapped,
            is_key_from_table: node.is_key_from_table,
            original_key_label: node.original_key_label.clone(),
            qualifier_parent: node.qualifier_parent.clone(),
            is_data_exception_done: node.is_data_exception_done,
            is_pure_autoextraction: node.is_pure_autoextraction,
            is_address_block_partial: node.is_address_block_partial.unwrap_or(false),
            status: node.status_value(),
            not_in_use: node.not_in_use.unwrap_or(false),
            ..DisplayRecord::default()
        };

        match node.node_type {
            NodeType::Batch => {
                record.document_type = Some(node.batch_document_type().to_string());
            }
            NodeType::Document => {
                record.vendor_name = Some(node.vendor_name.clone().unwrap_or_default());
                record.all_keys = Some(document_key_labels(node, excluded));
            }
            NodeType::Vendor => {
                record.value = Some(node.value.clone());
                record.page_id = Some(node.page_id.clone().unwrap_or_default());
                record.position = Some(position_or_empty(node.position.clone()));
            }
            _ => {}
        }
        self.records.push(record);

        if !expanded {
            return;
        }

        let child_scope = Scope {
            depth: scope.depth + 1,
            nested_label,
            key_id,
            transaction_id,
            parent_node_id: Some(node.id.clone()),
            draggable: false,
            draggable_target: false,
            document_id,
            batch_id: inherited_batch_id,
        };
        if node.node_type == NodeType::Document {
            self.expand_document(node, &child_scope, &lineage, excluded);
        } else {
            self.walk(&children, &child_scope, excluded);
        }
    }

    /// Children of an expanded document: vendor row, ungrouped children,
    /// then the Auto Extraction and Process Keys groups.
    fn expand_document<'n>(
        &mut self,
        node: &'n Node,
        child_scope: &Scope,
        lineage: &Lineage,
        excluded: &HashSet<&'n str>,
    ) {
        self.records.push(vendor_record(node, child_scope.depth, lineage));

        let partition = partition_keys(&node.children, excluded);
        let mut remaining_excluded = excluded.clone();
        remaining_excluded.extend(partition.grouped_ids());

        let remaining = visible_children(node, &remaining_excluded);
        if !remaining.is_empty() {
            self.walk(&remaining, child_scope, &remaining_excluded);
        }

        let address_block_partial = node.is_address_block_partial.unwrap_or(false);
        let groups = [
            (
                &partition.auto_extraction,
                GroupKind::AutoExtraction,
            ),
            (&partition.process_keys, GroupKind::ProcessKeys),
        ];
        for (members, kind) in groups {
            if members.is_empty() {
                continue;
            }
            let group_id = format!("{}.{}", node.id, kind.id_suffix());
            let nested_label = match &child_scope.nested_label {
                Some(parent) => format!("{}.{}", parent, kind.label_suffix()),
                None => kind.label_suffix().to_string(),
            };
            let expanded = self.view.expanded_nodes.contains(&group_id);

            self.records.push(DisplayRecord {
                id: group_id.clone(),
                node_id: group_id.clone(),
                title: kind.title().to_string(),
                node_type: kind.record_type().to_string(),
                label: kind.title().to_string(),
                depth: child_scope.depth,
                expandable: true,
                expanded,
                badge_variant: kind.badge(),
                status: Value::from(0),
                nested_label: Some(nested_label.clone()),
                config_data: ConfigData::with_options(kind.options()),
                transaction_id: lineage.transaction_id.clone(),
                batch_id: lineage.batch_id.clone(),
                current_batch_id: lineage.current_batch_id.clone(),
                document_id: lineage.document_id.clone(),
                parent_node_id: Some(node.id.clone()),
                is_profile_key_found: Some(false),
                is_pure_autoextraction: (kind == GroupKind::AutoExtraction).then_some(true),
                is_address_block_partial: address_block_partial,
                ..DisplayRecord::default()
            });

            if expanded {
                let group_scope = Scope {
                    depth: child_scope.depth + 1,
                    nested_label: Some(nested_label),
                    parent_node_id: Some(group_id),
                    draggable: kind == GroupKind::AutoExtraction,
                    draggable_target: kind == GroupKind::ProcessKeys,
                    ..child_scope.clone()
                };
                self.walk(members, &group_scope, excluded);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    AutoExtraction,
    ProcessKeys,
}

impl GroupKind {
    fn id_suffix(self) -> &'static str {
        match self {
            Self::AutoExtraction => "auto_extraction",
            Self::ProcessKeys => "process_keys",
        }
    }

    fn label_suffix(self) -> &'static str {
        match self {
            Self::AutoExtraction => "auto_extraction_keys",
            Self::ProcessKeys => "process_keys",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::AutoExtraction => AUTO_EXTRACTION_TITLE,
            Self::ProcessKeys => PROCESS_KEYS_TITLE,
        }
    }

    fn record_type(self) -> &'static str {
        match self {
            Self::AutoExtraction => "auto_extraction_parent",
            Self::ProcessKeys => "process_keys_parent",
        }
    }

    fn badge(self) -> BadgeVariant {
        match self {
            Self::AutoExtraction => BadgeVariant::Primary,
            Self::ProcessKeys => BadgeVariant::Secondary,
        }
    }

    fn options(self) -> Vec<NodeOption> {
        match self {
            Self::AutoExtraction => vec![NodeOption::HideEmptyAutoExtractionKeys],
            Self::ProcessKeys => Vec::new(),
        }
    }
}

/// Synthetic vendor row placed first under an expanded document.
fn vendor_record(document: &Node, depth: usize, lineage: &Lineage) -> DisplayRecord {
    let info = document.vendor.as_ref().and_then(VendorRef::info);
    let vendor_name = document.vendor_name.clone().unwrap_or_default();
    let page_id = info
        .and_then(|i| i.page_id.clone())
        .unwrap_or_default();
    let position = position_or_empty(info.and_then(|i| i.vendor_position.clone()));
    let profile_found = !vendor_name.is_empty()
        && info.and_then(|i| i.is_profile_key_found) != Some(false);

    let id = format!("{}_vendor", document.id);
    DisplayRecord {
        id: id.clone(),
        node_id: id,
        title: vendor_name.clone(),
        node_type: NodeType::Vendor.to_string(),
        label: VENDOR_LABEL.to_string(),
        depth,
        badge_variant: if profile_found {
            BadgeVariant::Success
        } else {
            BadgeVariant::Warning
        },
        status: Value::from(0),
        nested_label: Some("vendor".to_string()),
        config_data: ConfigData::with_options(vec![NodeOption::Rules, NodeOption::NotInUse]),
        transaction_id: lineage.transaction_id.clone(),
        batch_id: lineage.batch_id.clone(),
        current_batch_id: lineage.current_batch_id.clone(),
        document_id: lineage.document_id.clone(),
        parent_node_id: Some(document.id.clone()),
        is_profile_key_found: Some(profile_found),
        value: Some(vendor_name),
        page_id: Some(page_id),
        position: Some(position),
        ..DisplayRecord::default()
    }
}

fn position_or_empty(position: Option<Value>) -> Value {
    position
        .filter(|p| !p.is_null() && p.as_str() != Some(""))
        .unwrap_or_else(|| Value::String(String::new()))
}

fn visible_children<'n>(node: &'n Node, excluded: &HashSet<&'n str>) -> Vec<&'n Node> {
    node.children
        .iter()
        .filter(|child| !excluded.contains(child.id.as_str()))
        .collect()
}

/// Types that have displayable children anywhere under `nodes`.
fn expandable_types<'n>(nodes: &[&'n Node], excluded: &HashSet<&'n str>) -> HashSet<NodeType> {
    let mut types = HashSet::new();
    let mut stack: Vec<&Node> = nodes.to_vec();
    while let Some(node) = stack.pop() {
        let children = visible_children(node, excluded);
        if children.iter().any(|c| c.node_type.is_displayable()) {
            types.insert(node.node_type.clone());
        }
        stack.extend(children);
    }
    types
}

/// Occurrence index of each node among siblings of the same type.
fn type_indexes(nodes: &[&Node]) -> Vec<usize> {
    let mut counts: HashMap<&NodeType, usize> = HashMap::new();
    nodes
        .iter()
        .map(|node| {
            let count = counts.entry(&node.node_type).or_insert(0);
            let index = *count;
            *count += 1;
            index
        })
        .collect()
}

/// Distinct non-blank labels under a document, skipping table subtrees.
pub fn document_key_labels(document: &Node, excluded: &HashSet<&str>) -> Vec<String> {
    let mut labels = Vec::new();
    let mut seen = HashSet::new();
    collect_labels(document, excluded, &mut seen, &mut labels);
    labels
}

fn collect_labels<'n>(
    node: &'n Node,
    excluded: &HashSet<&str>,
    seen: &mut HashSet<&'n str>,
    labels: &mut Vec<String>,
) {
    if node.node_type.is_table_part() {
        return;
    }
    if !node.label.trim().is_empty() && seen.insert(node.label.as_str()) {
        labels.push(node.label.clone());
    }
    for child in &node.children {
        if !excluded.contains(child.id.as_str()) {
            collect_labels(child, excluded, seen, labels);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::DEFAULT_MAX_DEPTH;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Vec<Node> {
        serde_json::from_value(value).unwrap()
    }

    fn view(expanded: &[&str]) -> ViewState {
        ViewState {
            expanded_nodes: expanded.iter().map(|s| s.to_string()).collect(),
            ..ViewState::default()
        }
    }

    fn flatten(nodes: &[Node], view: &ViewState) -> Vec<DisplayRecord> {
        flat_nodes(nodes, view, DEFAULT_MAX_DEPTH).unwrap()
    }

    fn ids(records: &[DisplayRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn transaction() -> Vec<Node> {
        tree(json!([
            {"id": "T1", "type": "root", "children": [
                {"id": "M20240101.US1", "type": "batch", "document_types": "Invoice", "children": [
                    {"id": "M20240101.US1.D2", "type": "document", "Vendor": "ACME",
                     "vendor": {"page_id": "p1", "vendor_position": "1,2", "is_profile_key_found": true},
                     "children": [
                        {"id": "M20240101.US1.D2.K", "type": "key", "children": [
                            {"id": "green", "type": "key_detail", "label": "shipper", "STATUS": 1,
                             "is_profile_key_found": true, "is_pure_autoextraction": true,
                             "children": [{"id": "green.name", "type": "keyTextDetail", "label": "name", "v": "ACME"}]},
                            {"id": "auto", "type": "keyTextDetail", "label": "gross", "v": "10",
                             "is_profile_key_found": false, "is_pure_autoextraction": true},
                            {"id": "proc-z", "type": "keyTextDetail", "label": "zeta", "v": "z"},
                            {"id": "proc-a", "type": "keyTextDetail", "label": "alpha", "v": "a"}
                        ]},
                        {"id": "M20240101.US1.D2.T", "type": "table", "children": [
                            {"id": "r1", "type": "row", "children": [{"id": "c1", "type": "cell", "label": "Qty"}]}
                        ]}
                     ]},
                    {"id": "M20240101.US1.D1", "type": "document", "DocType": "Waybill"}
                ]}
            ]}
        ]))
    }

    #[test]
    fn test_collapsed_tree_shows_roots_only() {
        let nodes = transaction();
        let records = flatten(&nodes, &view(&[]));
        assert_eq!(ids(&records), vec!["T1"]);
        assert!(records[0].expandable);
        assert!(!records[0].expanded);
        assert_eq!(records[0].title, "T1");
        assert_eq!(records[0].badge_variant, BadgeVariant::Info);
    }

    #[test]
    fn test_expanded_document_groups_keys() {
        let nodes = transaction();
        let state = view(&[
            "T1",
            "M20240101.US1",
            "M20240101.US1.D2",
            "M20240101.US1.D2.auto_extraction",
            "M20240101.US1.D2.process_keys",
        ]);
        let records = flatten(&nodes, &state);
        assert_eq!(
            ids(&records),
            vec![
                "T1",
                "M20240101.US1",
                "M20240101.US1.D1",
                "M20240101.US1.D2",
                "M20240101.US1.D2_vendor",
                "green",
                "M20240101.US1.D2.auto_extraction",
                "auto",
                "M20240101.US1.D2.process_keys",
                "proc-a",
                "proc-z",
            ]
        );

        let by_id: HashMap<&str, &DisplayRecord> = records.iter().map(|r| (r.id.as_str(), r)).collect();

        let doc = by_id["M20240101.US1.D2"];
        assert_eq!(doc.depth, 2);
        assert_eq!(doc.vendor_name.as_deref(), Some("ACME"));
        assert_eq!(doc.current_batch_id.as_deref(), Some("M20240101.US1"));
        assert_eq!(doc.transaction_id.as_deref(), Some("T1"));
        assert_eq!(
            doc.all_keys.as_deref().unwrap(),
            &["shipper".to_string(), "name".to_string(), "gross".to_string(), "zeta".to_string(), "alpha".to_string()]
        );

        let batch = by_id["M20240101.US1"];
        assert_eq!(batch.document_type.as_deref(), Some("Invoice"));
        assert_eq!(batch.batch_id.as_deref(), Some("M20240101.US1"));

        let vendor = by_id["M20240101.US1.D2_vendor"];
        assert_eq!(vendor.depth, 3);
        assert_eq!(vendor.badge_variant, BadgeVariant::Success);
        assert_eq!(vendor.label, VENDOR_LABEL);
        assert_eq!(vendor.page_id.as_deref(), Some("p1"));
        assert_eq!(vendor.position, Some(json!("1,2")));

        let green = by_id["green"];
        assert_eq!(green.depth, 3);
        assert_eq!(green.title, "ACME");
        assert_eq!(green.parent_node_id.as_deref(), Some("M20240101.US1.D2.K"));
        assert_eq!(green.document_id.as_deref(), Some("M20240101.US1.D2"));
        assert_eq!(green.badge_variant, BadgeVariant::Success);
        assert!(green.expandable);

        let auto_group = by_id["M20240101.US1.D2.auto_extraction"];
        assert_eq!(auto_group.badge_variant, BadgeVariant::Primary);
        assert_eq!(auto_group.nested_label.as_deref(), Some("auto_extraction_keys"));
        assert_eq!(auto_group.depth, 3);

        let auto = by_id["auto"];
        assert_eq!(auto.depth, 4);
        assert!(auto.draggable);
        assert_eq!(auto.nested_label.as_deref(), Some("auto_extraction_keys.gross"));
        assert_eq!(auto.parent_node_id.as_deref(), Some("M20240101.US1.D2.auto_extraction"));

        let process_group = by_id["M20240101.US1.D2.process_keys"];
        assert_eq!(process_group.badge_variant, BadgeVariant::Secondary);
        assert!(by_id["proc-a"].draggable_target);
    }

    #[test]
    fn test_collapsed_groups_hide_members() {
        let nodes = transaction();
        let records = flatten(&nodes, &view(&["T1", "M20240101.US1", "M20240101.US1.D2"]));
        let listed = ids(&records);
        assert!(listed.contains(&"M20240101.US1.D2.auto_extraction"));
        assert!(listed.contains(&"M20240101.US1.D2.process_keys"));
        assert!(!listed.contains(&"auto"));
        assert!(!listed.contains(&"proc-a"));
        // Grouped nodes never reappear in their original slot.
        assert_eq!(listed.iter().filter(|id| **id == "auto").count(), 0);
    }

    #[test]
    fn test_document_sort_order_desc() {
        let nodes = transaction();
        let mut state = view(&["T1", "M20240101.US1"]);
        state.document_sort_order = SortOrder::Desc;
        let records = flatten(&nodes, &state);
        assert_eq!(
            ids(&records),
            vec!["T1", "M20240101.US1", "M20240101.US1.D2", "M20240101.US1.D1"]
        );
        assert_eq!(records[3].title, "M20240101.US1.D1 - Waybill");
    }

    #[test]
    fn test_document_without_vendor_gets_warning_row() {
        let nodes = tree(json!([{"id": "D", "type": "document", "children": [
            {"id": "K", "type": "key", "children": [
                {"id": "k1", "type": "keyTextDetail", "label": "a", "is_profile_key_found": true, "is_pure_autoextraction": true}
            ]}
        ]}]));
        let records = flatten(&nodes, &view(&["D"]));
        assert_eq!(ids(&records), vec!["D", "D_vendor", "k1"]);
        assert_eq!(records[1].badge_variant, BadgeVariant::Warning);
        assert_eq!(records[1].is_profile_key_found, Some(false));
        assert_eq!(records[1].title, "");
    }

    #[test]
    fn test_lazy_subtree_expandable_at_depth_zero() {
        let nodes = tree(json!([
            {"id": "B1", "type": "batch", "children": [{"id": "D1", "type": "document"}]},
            {"id": "B2", "type": "batch"}
        ]));
        let records = flatten(&nodes, &view(&[]));
        assert!(records[0].expandable);
        assert!(records[1].expandable);
    }

    #[test]
    fn test_key_nodes_are_transparent() {
        let nodes = tree(json!([
            {"id": "K", "type": "key", "children": [
                {"id": "a", "type": "keyTextDetail", "label": "a", "v": "1"},
                {"id": "page", "type": "page"}
            ]}
        ]));
        let records = flatten(&nodes, &view(&[]));
        assert_eq!(ids(&records), vec!["a"]);
        assert_eq!(records[0].depth, 0);
        assert_eq!(records[0].parent_node_id.as_deref(), Some("K"));
    }

    #[test]
    fn test_highlight_and_search_match() {
        let nodes = tree(json!([{"id": "a", "type": "vendor", "v": "ACME", "pos": "0,0"}]));
        let mut state = view(&[]);
        state.matched_nodes.insert("a".to_string());
        state.selected_node = Some(SelectedNode { id: "a".to_string(), highlight: true });
        let records = flatten(&nodes, &state);
        assert!(records[0].highlighted);
        assert!(records[0].search_match);
        assert_eq!(records[0].is_profile_key_found, Some(true));
        assert_eq!(records[0].value.as_deref(), Some("ACME"));
        assert_eq!(records[0].title, "Vendor - 0");

        state.highlight_root_nodes = true;
        assert!(!flatten(&nodes, &state)[0].highlighted);
    }

    #[test]
    fn test_nested_label_and_address_block() {
        let nodes = tree(json!([{"id": "D", "type": "document", "children": [
            {"id": "K", "type": "key", "children": [
                {"id": "s", "type": "key_detail", "label": "shipper", "is_profile_key_found": true, "is_pure_autoextraction": true,
                 "children": [{"id": "s.n", "type": "keyTextDetail", "label": "name", "v": "ACME",
                               "is_profile_key_found": true, "is_pure_autoextraction": true}]}
            ]}
        ]}]));
        let mut state = view(&["D", "s"]);
        state.address_block_keys = vec!["shipper".to_string()];
        let records = flatten(&nodes, &state);
        assert_eq!(ids(&records), vec!["D", "D_vendor", "s", "s.n"]);
        assert!(records[2].config_data.options.contains(&NodeOption::AddToDb));
        assert_eq!(records[3].nested_label.as_deref(), Some("shipper.name"));
        assert!(records[3].config_data.options.contains(&NodeOption::Lookup));
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let nodes = transaction();
        let state = view(&["T1", "M20240101.US1", "M20240101.US1.D2", "M20240101.US1.D2.process_keys"]);
        assert_eq!(flatten(&nodes, &state), flatten(&nodes, &state));
    }

    #[test]
    fn test_input_tree_is_not_mutated() {
        let nodes = transaction();
        let snapshot = nodes.clone();
        let _ = flatten(&nodes, &view(&["T1", "M20240101.US1", "M20240101.US1.D2"]));
        assert_eq!(nodes, snapshot);
    }

    #[test]
    fn test_cycle_is_reported() {
        let nodes = tree(json!([{"id": "a", "type": "root", "children": [{"id": "a", "type": "batch"}]}]));
        let err = flat_nodes(&nodes, &view(&[]), DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
    }

    #[test]
    fn test_view_state_deserializes_from_ui_shape() {
        let state: ViewState = serde_json::from_value(json!({
            "expandedNodes": ["a", "b"],
            "selectedNode": {"id": "a", "highlight": true},
            "documentSortOrder": "desc"
        }))
        .unwrap();
        assert_eq!(state.expanded_nodes.len(), 2);
        assert_eq!(state.document_sort_order, SortOrder::Desc);
        assert!(state.matched_nodes.is_empty());
    }
}
