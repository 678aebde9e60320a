//! Document-tree node types.
//!
//! Nodes arrive from the extraction backend as loosely shaped JSON whose field
//! names drifted across schema versions (`label`/`key`, `v`/`value`,
//! `qualifierParent`/`qualifier_parent`, `position`/`pos`). Every node is
//! normalized once through [`RawNode`] so the rest of the crate reads a single
//! canonical field.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Node kind, discriminated by the `type` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NodeType {
    Root,
    Batch,
    Document,
    DocBuilder,
    Vendor,
    Key,
    KeyText,
    KeyDetail,
    KeyDetailRobot,
    KeyDetailStatic,
    KeyTextDetail,
    KeyTextDetailRobot,
    KeyTextDetailStatic,
    Word,
    Words,
    Page,
    Line,
    Table,
    TableHeader,
    TableBody,
    TableFooter,
    Row,
    Cell,
    /// Any type string this crate does not model. Treated as inert.
    Unknown(String),
    #[default]
    Untyped,
}

impl NodeType {
    pub fn parse(s: &str) -> Self {
        match s {
            "root" => Self::Root,
            "batch" => Self::Batch,
            "document" => Self::Document,
            "docBuilder" => Self::DocBuilder,
            "vendor" => Self::Vendor,
            "key" => Self::Key,
            "keyText" => Self::KeyText,
            "key_detail" => Self::KeyDetail,
            "key_detail_robot" => Self::KeyDetailRobot,
            "key_detail_static" => Self::KeyDetailStatic,
            "keyTextDetail" => Self::KeyTextDetail,
            "keyTextDetailRobot" => Self::KeyTextDetailRobot,
            "keyTextDetailStatic" => Self::KeyTextDetailStatic,
            "word" => Self::Word,
            "words" => Self::Words,
            "page" => Self::Page,
            "line" => Self::Line,
            "table" => Self::Table,
            "tableHeader" => Self::TableHeader,
            "tableBody" => Self::TableBody,
            "tableFooter" => Self::TableFooter,
            "row" => Self::Row,
            "cell" => Self::Cell,
            "" => Self::Untyped,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "root",
            Self::Batch => "batch",
            Self::Document => "document",
            Self::DocBuilder => "docBuilder",
            Self::Vendor => "vendor",
            Self::Key => "key",
            Self::KeyText => "keyText",
            Self::KeyDetail => "key_detail",
            Self::KeyDetailRobot => "key_detail_robot",
            Self::KeyDetailStatic => "key_detail_static",
            Self::KeyTextDetail => "keyTextDetail",
            Self::KeyTextDetailRobot => "keyTextDetailRobot",
            Self::KeyTextDetailStatic => "keyTextDetailStatic",
            Self::Word => "word",
            Self::Words => "words",
            Self::Page => "page",
            Self::Line => "line",
            Self::Table => "table",
            Self::TableHeader => "tableHeader",
            Self::TableBody => "tableBody",
            Self::TableFooter => "tableFooter",
            Self::Row => "row",
            Self::Cell => "cell",
            Self::Unknown(raw) => raw,
            Self::Untyped => "",
        }
    }

    /// `key_detail` and its robot/static variants.
    pub fn is_key_detail(&self) -> bool {
        matches!(
            self,
            Self::KeyDetail | Self::KeyDetailRobot | Self::KeyDetailStatic
        )
    }

    /// `keyTextDetail` and its robot/static variants.
    pub fn is_key_text_detail(&self) -> bool {
        matches!(
            self,
            Self::KeyTextDetail | Self::KeyTextDetailRobot | Self::KeyTextDetailStatic
        )
    }

    /// Eligible for Auto-Extraction / Process-Key grouping.
    pub fn is_categorizable(&self) -> bool {
        self.is_key_detail() || self.is_key_text_detail()
    }

    /// Part of a table subtree; excluded from document key enumeration.
    pub fn is_table_part(&self) -> bool {
        matches!(
            self,
            Self::Table
                | Self::Row
                | Self::Cell
                | Self::TableHeader
                | Self::TableBody
                | Self::TableFooter
        )
    }

    /// Types the flattener emits (or unwraps, for `key`).
    pub fn is_displayable(&self) -> bool {
        matches!(
            self,
            Self::Root | Self::Batch | Self::Document | Self::Vendor | Self::Key
        ) || self.is_categorizable()
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Self::Word | Self::Words)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::parse(&s)).unwrap_or_default())
    }
}

/// Vendor reference carried by batch and document nodes.
///
/// Batches built from a transaction payload carry the bare vendor name;
/// documents carry the detail object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VendorRef {
    Name(String),
    Info(VendorInfo),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_position: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_profile_key_found: Option<bool>,
}

impl VendorRef {
    pub fn info(&self) -> Option<&VendorInfo> {
        match self {
            Self::Info(info) => Some(info),
            Self::Name(_) => None,
        }
    }
}

/// Extraction-rule payload on a key-detail node. Anchor shapes win when the
/// backend sends both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExtractionRule {
    #[serde(rename = "anchorShapes")]
    AnchorShapes(Value),
    #[serde(rename = "regexExtractor")]
    RegexExtractor(Value),
}

impl ExtractionRule {
    fn from_parts(anchor_shapes: Option<Value>, regex_extractor: Option<Value>) -> Option<Self> {
        match (non_null(anchor_shapes), non_null(regex_extractor)) {
            (Some(shapes), _) => Some(Self::AnchorShapes(shapes)),
            (None, Some(regex)) => Some(Self::RegexExtractor(regex)),
            (None, None) => None,
        }
    }

    /// Anchor payload used for highlighting.
    pub fn anchors(&self) -> Option<&Value> {
        match self {
            Self::AnchorShapes(shapes) => Some(shapes),
            Self::RegexExtractor(regex) => regex.get("anchors").filter(|a| !a.is_null()),
        }
    }
}

/// One `{id, v}` style entry on a page node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStyle {
    pub id: String,
    #[serde(default)]
    pub v: String,
}

/// A node of the extraction tree with legacy field names folded together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(rename = "v", skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(rename = "STATUS", skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_profile_key_found: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pure_autoextraction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_auto_extracted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_label_mapped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_key_from_table: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_column_mapped_to_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_data_exception_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_address_block_partial: Option<bool>,
    #[serde(rename = "notInUse", skip_serializing_if = "Option::is_none")]
    pub not_in_use: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_key_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier_parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    #[serde(rename = "batchId", skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(rename = "pageId", skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(rename = "pos", skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,

    #[serde(rename = "DocType", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_json: Option<Value>,
    #[serde(rename = "Vendor", skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorRef>,
    #[serde(rename = "Language", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
    #[serde(rename = "subPath", skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    #[serde(rename = "sourceFileName", skip_serializing_if = "Option::is_none")]
    pub source_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    #[serde(rename = "cellRange", skip_serializing_if = "Option::is_none")]
    pub cell_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worksheet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_unique_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<PageStyle>,
    #[serde(rename = "IMAGEFILE", skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
    #[serde(rename = "s", skip_serializing_if = "Option::is_none")]
    pub style_id: Option<Value>,

    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub extraction_rule: Option<ExtractionRule>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            ..Self::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// `DocumentType` nested under `data_json`, if any.
    fn data_json_document_type(&self) -> Option<&str> {
        self.data_json
            .as_ref()
            .and_then(|d| d.get("DocumentType"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Document type of a `document` node (`DocType`, then `data_json.DocumentType`).
    pub fn document_type(&self) -> &str {
        self.doc_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.data_json_document_type())
            .unwrap_or("")
    }

    /// Document type of a `batch` node (`document_types`, then `data_json.DocumentType`).
    pub fn batch_document_type(&self) -> &str {
        self.document_types
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.data_json_document_type())
            .unwrap_or("")
    }

    /// Display title for this node; `index` is its occurrence among
    /// same-typed siblings and feeds the positional fallback.
    pub fn title(&self, index: Option<usize>) -> String {
        match &self.node_type {
            NodeType::Root | NodeType::Batch => self.id.clone(),
            NodeType::Document => {
                let doc_type = self.document_type();
                if doc_type.is_empty() {
                    self.id.clone()
                } else {
                    format!("{} - {}", self.id, doc_type)
                }
            }
            t if t.is_key_detail() => self
                .children
                .iter()
                .find(|child| child.label == "name")
                .map(|child| child.value.clone())
                .unwrap_or_else(|| self.value.clone()),
            t if t.is_key_text_detail() => self.value.clone(),
            other => match index {
                Some(i) => format!("{} - {}", capitalize(other.as_str()), i),
                None => capitalize(other.as_str()),
            },
        }
    }

    /// `STATUS`, with falsy values (missing, `false`, `0`, `""`) read as 0.
    pub fn status_value(&self) -> Value {
        match &self.status {
            Some(value) if is_truthy(value) => value.clone(),
            _ => Value::from(0),
        }
    }

    /// Integral status code. Strings and fractional numbers have none.
    pub fn status_code(&self) -> Option<i64> {
        let value = self.status_value();
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        })
    }

    /// Badge variant for the node's status; statuses without a code get no badge.
    pub fn badge_variant(&self) -> crate::record::BadgeVariant {
        self.status_code()
            .map(crate::record::BadgeVariant::from_status)
            .unwrap_or(crate::record::BadgeVariant::None)
    }
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Boundary normalization
// ============================================================================

/// Wire shape of a node as the backend sends it, with every historical alias.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNode {
    id: Option<Value>,
    #[serde(rename = "type")]
    node_type: NodeType,
    label: Option<String>,
    key: Option<String>,
    v: Option<Value>,
    value: Option<Value>,
    children: Option<Vec<Node>>,
    #[serde(rename = "STATUS")]
    status: Option<Value>,

    is_profile_key_found: Option<bool>,
    is_pure_autoextraction: Option<bool>,
    is_auto_extracted: Option<bool>,
    is_label_mapped: Option<bool>,
    is_key_from_table: Option<bool>,
    is_column_mapped_to_key: Option<bool>,
    is_data_exception_done: Option<bool>,
    is_address_block_partial: Option<bool>,
    #[serde(rename = "notInUse")]
    not_in_use: Option<bool>,
    original_key_label: Option<String>,
    #[serde(rename = "qualifierParent")]
    qualifier_parent_camel: Option<String>,
    qualifier_parent: Option<String>,
    unique_id: Option<Value>,

    #[serde(rename = "batchId")]
    batch_id: Option<String>,
    #[serde(rename = "pageId")]
    page_id: Option<Value>,
    position: Option<Value>,
    pos: Option<Value>,

    #[serde(rename = "DocType")]
    doc_type: Option<String>,
    document_types: Option<String>,
    data_json: Option<Value>,
    #[serde(rename = "Vendor")]
    vendor_name: Option<String>,
    vendor: Option<VendorRef>,
    #[serde(rename = "Language")]
    language: Option<String>,
    layout_id: Option<Value>,
    profile: Option<Value>,
    #[serde(rename = "subPath")]
    sub_path: Option<String>,
    #[serde(rename = "sourceFileName")]
    source_file_name: Option<String>,
    ext: Option<String>,

    #[serde(rename = "cellRange")]
    cell_range: Option<String>,
    worksheet_name: Option<String>,
    table_unique_id: Option<Value>,
    table_name: Option<String>,
    table_id: Option<Value>,

    styles: Option<Vec<PageStyle>>,
    #[serde(rename = "IMAGEFILE")]
    image_file: Option<String>,
    s: Option<Value>,

    #[serde(rename = "anchorShapes")]
    anchor_shapes: Option<Value>,
    #[serde(rename = "regexExtractor")]
    regex_extractor: Option<Value>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        Self {
            id: raw.id.and_then(scalar_string).unwrap_or_default(),
            node_type: raw.node_type,
            label: first_present(raw.label, raw.key).unwrap_or_default(),
            value: first_present(
                raw.v.and_then(scalar_string),
                raw.value.and_then(scalar_string),
            )
            .unwrap_or_default(),
            children: raw.children.unwrap_or_default(),
            status: raw.status.filter(|v| !v.is_null()),
            is_profile_key_found: raw.is_profile_key_found,
            is_pure_autoextraction: raw.is_pure_autoextraction,
            is_auto_extracted: raw.is_auto_extracted,
            is_label_mapped: raw.is_label_mapped,
            is_key_from_table: raw.is_key_from_table,
            is_column_mapped_to_key: raw.is_column_mapped_to_key,
            is_data_exception_done: raw.is_data_exception_done,
            is_address_block_partial: raw.is_address_block_partial,
            not_in_use: raw.not_in_use,
            original_key_label: raw.original_key_label,
            qualifier_parent: first_present(raw.qualifier_parent_camel, raw.qualifier_parent),
            unique_id: raw.unique_id.and_then(scalar_string),
            batch_id: raw.batch_id,
            page_id: raw.page_id.and_then(scalar_string),
            position: first_truthy(raw.position, raw.pos),
            doc_type: raw.doc_type,
            document_types: raw.document_types,
            data_json: non_null(raw.data_json),
            vendor_name: raw.vendor_name,
            vendor: raw.vendor,
            language: raw.language,
            layout_id: non_null(raw.layout_id),
            profile: non_null(raw.profile),
            sub_path: raw.sub_path,
            source_file_name: raw.source_file_name,
            ext: raw.ext,
            cell_range: raw.cell_range,
            worksheet_name: raw.worksheet_name,
            table_unique_id: non_null(raw.table_unique_id),
            table_name: raw.table_name,
            table_id: non_null(raw.table_id),
            styles: raw.styles.unwrap_or_default(),
            image_file: raw.image_file,
            style_id: non_null(raw.s),
            extraction_rule: ExtractionRule::from_parts(raw.anchor_shapes, raw.regex_extractor),
        }
    }
}

/// First non-empty string of two aliases.
fn first_present(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.filter(|s| !s.is_empty()))
}

/// First of two JSON aliases that is neither null, `false`, `0` nor `""`.
fn first_truthy(primary: Option<Value>, fallback: Option<Value>) -> Option<Value> {
    primary
        .filter(is_truthy)
        .or_else(|| fallback.filter(is_truthy))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

/// Render a scalar JSON value as a string; null and containers yield `None`.
fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_legacy_label_and_value_fold() {
        let legacy = node(json!({"id": "a", "type": "key_detail", "key": "invoice", "value": "INV-1"}));
        assert_eq!(legacy.label(), "invoice");
        assert_eq!(legacy.value(), "INV-1");

        let current = node(json!({"id": "b", "type": "key_detail", "label": "total", "v": 42}));
        assert_eq!(current.label(), "total");
        assert_eq!(current.value(), "42");

        let both = node(json!({"id": "c", "type": "word", "label": "", "key": "fallback", "v": "", "value": "x"}));
        assert_eq!(both.label(), "fallback");
        assert_eq!(both.value(), "x");
    }

    #[test]
    fn test_missing_fields_default() {
        let bare = node(json!({"id": "x", "type": "page"}));
        assert_eq!(bare.label(), "");
        assert_eq!(bare.value(), "");
        assert!(bare.children().is_empty());
        assert_eq!(bare.status, None);

        let nulls = node(json!({"id": "y", "type": "cell", "children": null, "label": null}));
        assert!(nulls.children().is_empty());
        assert_eq!(nulls.label(), "");
    }

    #[test]
    fn test_unknown_type_round_trips() {
        let n = node(json!({"id": "z", "type": "signature"}));
        assert_eq!(n.node_type, NodeType::Unknown("signature".to_string()));
        assert!(!n.node_type.is_displayable());
        let out = serde_json::to_value(&n).unwrap();
        assert_eq!(out["type"], "signature");
    }

    #[test]
    fn test_document_title() {
        let with_doc_type = node(json!({"id": "M1.US1", "type": "document", "DocType": "Invoice"}));
        assert_eq!(with_doc_type.title(Some(0)), "M1.US1 - Invoice");

        let nested = node(json!({"id": "M1.US2", "type": "document", "data_json": {"DocumentType": "Waybill"}}));
        assert_eq!(nested.title(Some(0)), "M1.US2 - Waybill");

        let plain = node(json!({"id": "M1.US3", "type": "document"}));
        assert_eq!(plain.title(Some(0)), "M1.US3");
    }

    #[test]
    fn test_key_detail_title_prefers_name_child() {
        let n = node(json!({
            "id": "k", "type": "key_detail_robot", "v": "own",
            "children": [
                {"id": "k.1", "type": "keyTextDetail", "label": "city", "v": "Austin"},
                {"id": "k.2", "type": "keyTextDetail", "key": "name", "value": "ACME"}
            ]
        }));
        assert_eq!(n.title(None), "ACME");

        let no_name = node(json!({"id": "k", "type": "key_detail", "v": "own"}));
        assert_eq!(no_name.title(None), "own");
    }

    #[test]
    fn test_positional_title_fallback() {
        let page = node(json!({"id": "p", "type": "page"}));
        assert_eq!(page.title(Some(3)), "Page - 3");
        let text = node(json!({"id": "t", "type": "keyTextDetailStatic", "v": "hello"}));
        assert_eq!(text.title(Some(3)), "hello");
    }

    #[test]
    fn test_position_and_qualifier_aliases() {
        let n = node(json!({
            "id": "n", "type": "vendor", "pos": "1,2,3,4", "qualifierParent": "references"
        }));
        assert_eq!(n.position, Some(json!("1,2,3,4")));
        assert_eq!(n.qualifier_parent.as_deref(), Some("references"));

        let snake = node(json!({"id": "n", "type": "vendor", "qualifier_parent": "shipper"}));
        assert_eq!(snake.qualifier_parent.as_deref(), Some("shipper"));
    }

    #[test]
    fn test_extraction_rule_precedence() {
        let both = node(json!({
            "id": "r", "type": "key_detail",
            "anchorShapes": {"a": 1},
            "regexExtractor": {"anchors": {"b": 2}}
        }));
        assert_eq!(both.extraction_rule.as_ref().unwrap().anchors(), Some(&json!({"a": 1})));

        let regex = node(json!({"id": "r", "type": "key_detail", "anchorShapes": null, "regexExtractor": {"anchors": {"b": 2}}}));
        assert!(matches!(regex.extraction_rule, Some(ExtractionRule::RegexExtractor(_))));
        assert_eq!(regex.extraction_rule.unwrap().anchors(), Some(&json!({"b": 2})));
    }

    #[test]
    fn test_vendor_ref_shapes() {
        let batch = node(json!({"id": "b", "type": "batch", "vendor": "ACME"}));
        assert_eq!(batch.vendor, Some(VendorRef::Name("ACME".to_string())));

        let doc = node(json!({"id": "d", "type": "document", "vendor": {"page_id": "p1", "is_profile_key_found": false}}));
        let info = doc.vendor.as_ref().and_then(VendorRef::info).unwrap();
        assert_eq!(info.page_id.as_deref(), Some("p1"));
        assert_eq!(info.is_profile_key_found, Some(false));
    }

    #[test]
    fn test_status_codes_are_integral_numbers() {
        use crate::record::BadgeVariant;

        let danger = node(json!({"id": "s", "type": "cell", "STATUS": -2}));
        assert_eq!(danger.status_code(), Some(-2));
        assert_eq!(danger.badge_variant(), BadgeVariant::Danger);

        let whole = node(json!({"id": "s", "type": "cell", "STATUS": 1.0}));
        assert_eq!(whole.badge_variant(), BadgeVariant::Success);

        for status in [json!("111"), json!(1.9), json!(true)] {
            let n = node(json!({"id": "s", "type": "cell", "STATUS": status.clone()}));
            assert_eq!(n.status_code(), None, "{}", status);
            assert_eq!(n.badge_variant().as_str(), "", "{}", status);
            assert_eq!(n.status_value(), status);
        }

        for falsy in [json!(null), json!(0), json!(""), json!(false)] {
            let n = node(json!({"id": "s", "type": "cell", "STATUS": falsy.clone()}));
            assert_eq!(n.status_value(), json!(0), "{}", falsy);
            assert_eq!(n.badge_variant(), BadgeVariant::Info, "{}", falsy);
        }
        assert_eq!(node(json!({"id": "s", "type": "cell"})).badge_variant(), BadgeVariant::Info);
    }
}
