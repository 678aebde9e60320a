//! Page-level views of the tree used by the document viewer: a node index
//! for highlighting, page word lists with parsed styles, and per-document
//! position lists.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::schema::{Node, NodeType};

/// Lookup entry for one node id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub doc_id: Option<String>,
    pub page_id: Option<String>,
    pub pos: Option<Value>,
    pub highlight: bool,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    pub cell_range: Option<String>,
    pub sheet_name: Option<String>,
}

/// Index every node by id. Later duplicates overwrite earlier ones.
pub fn index_nodes(nodes: &[Node]) -> BTreeMap<String, IndexEntry> {
    let mut index = BTreeMap::new();
    collect_index(nodes, None, None, &mut index);
    index
}

fn collect_index(
    nodes: &[Node],
    page_id: Option<&str>,
    doc_id: Option<&str>,
    index: &mut BTreeMap<String, IndexEntry>,
) {
    for node in nodes {
        let page_id = match node.node_type {
            NodeType::Page => Some(node.id.as_str()),
            _ => node.page_id.as_deref().or(page_id),
        };
        let doc_id = match node.node_type {
            NodeType::Document | NodeType::DocBuilder => Some(node.id.as_str()),
            _ => doc_id,
        };

        let highlight_pdf = node.position.is_some()
            && page_id.is_some_and(|p| !p.is_empty())
            && node.node_type != NodeType::Page;
        let highlight_sheet = node.cell_range.as_deref().is_some_and(|c| !c.is_empty())
            && node.worksheet_name.as_deref().is_some_and(|w| !w.is_empty());

        index.insert(
            node.id.clone(),
            IndexEntry {
                doc_id: doc_id.map(str::to_string),
                page_id: page_id.map(str::to_string),
                pos: node.position.clone(),
                highlight: highlight_pdf || highlight_sheet,
                node_type: node.node_type.clone(),
                label: node.label.clone(),
                cell_range: node.cell_range.clone(),
                sheet_name: node.worksheet_name.clone(),
            },
        );

        collect_index(&node.children, page_id, doc_id, index);
    }
}

/// Every `word` node in pre-order.
pub fn word_nodes(nodes: &[Node]) -> Vec<&Node> {
    let mut words = Vec::new();
    collect_words(nodes, &mut words);
    words
}

fn collect_words<'n>(nodes: &'n [Node], words: &mut Vec<&'n Node>) {
    for node in nodes {
        if node.node_type == NodeType::Word {
            words.push(node);
        }
        collect_words(&node.children, words);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWord {
    pub id: String,
    pub pos: Option<Value>,
    pub v: String,
    pub style_id: Option<Value>,
}

pub type StyleMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub pos: Option<Value>,
    pub word_nodes: Vec<PageWord>,
    pub image_file: Option<String>,
    pub styles: BTreeMap<String, StyleMap>,
}

/// Parse a `"font-size: 9px; color: red"` declaration list. Entries without a
/// `:` or with a blank property name are skipped.
pub fn parse_style(declarations: &str) -> StyleMap {
    declarations
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Every `page` node by id with its words and parsed styles.
pub fn parse_pages(nodes: &[Node]) -> BTreeMap<String, PageEntry> {
    let mut pages = BTreeMap::new();
    collect_pages(nodes, &mut pages);
    pages
}

fn collect_pages(nodes: &[Node], pages: &mut BTreeMap<String, PageEntry>) {
    for node in nodes {
        if node.node_type == NodeType::Page {
            let styles = node
                .styles
                .iter()
                .map(|style| (style.id.clone(), parse_style(&style.v)))
                .collect();
            let word_nodes = word_nodes(&node.children)
                .into_iter()
                .map(|word| PageWord {
                    id: word.id.clone(),
                    pos: word.position.clone(),
                    v: word.value.clone(),
                    style_id: word.style_id.clone(),
                })
                .collect();
            pages.insert(
                node.id.clone(),
                PageEntry {
                    pos: node.position.clone(),
                    word_nodes,
                    image_file: node.image_file.clone(),
                    styles,
                },
            );
        }
        collect_pages(&node.children, pages);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub pos: Option<Value>,
}

/// Per root node, page id to child positions. `document` children are pages;
/// `docBuilder` children are lines grouped by their `pageId`.
pub fn root_node_list(nodes: &[Node]) -> BTreeMap<String, BTreeMap<String, Vec<Position>>> {
    let mut roots = BTreeMap::new();
    collect_roots(nodes, &mut roots);
    roots
}

fn collect_roots(nodes: &[Node], roots: &mut BTreeMap<String, BTreeMap<String, Vec<Position>>>) {
    for node in nodes {
        match node.node_type {
            NodeType::Document => {
                let pages = node
                    .children
                    .iter()
                    .map(|page| {
                        let positions = page
                            .children
                            .iter()
                            .map(|child| Position {
                                pos: child.position.clone(),
                            })
                            .collect();
                        (page.id.clone(), positions)
                    })
                    .collect();
                roots.insert(node.id.clone(), pages);
            }
            NodeType::DocBuilder => {
                let mut pages: BTreeMap<String, Vec<Position>> = BTreeMap::new();
                for line in &node.children {
                    pages
                        .entry(line.page_id.clone().unwrap_or_default())
                        .or_default()
                        .push(Position {
                            pos: line.position.clone(),
                        });
                }
                roots.insert(node.id.clone(), pages);
            }
            _ => {}
        }
        collect_roots(&node.children, roots);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Vec<Node> {
        serde_json::from_value(value).unwrap()
    }

    fn document() -> Vec<Node> {
        tree(json!([
            {"id": "D1", "type": "document", "children": [
                {"id": "P1", "type": "page", "IMAGEFILE": "p1.png", "pos": "0,0,100,100",
                 "styles": [{"id": "s0", "v": "font-size: 9px; color: red;; : x; bad"}],
                 "children": [
                    {"id": "L1", "type": "line", "pos": "1,1,50,5", "children": [
                        {"id": "W1", "type": "word", "v": "Invoice", "pos": "1,1,10,5", "s": "s0"},
                        {"id": "W2", "type": "words", "v": "skip"}
                    ]}
                 ]},
                {"id": "P2", "type": "page"}
            ]},
            {"id": "X1", "type": "cell", "cellRange": "B2", "worksheet_name": "Sheet1"}
        ]))
    }

    #[test]
    fn test_index_inherits_page_and_document() {
        let index = index_nodes(&document());
        let word = &index["W1"];
        assert_eq!(word.doc_id.as_deref(), Some("D1"));
        assert_eq!(word.page_id.as_deref(), Some("P1"));
        assert!(word.highlight);

        assert!(!index["P1"].highlight);
        assert!(!index["W2"].highlight);
        assert_eq!(index["D1"].page_id, None);

        let cell = &index["X1"];
        assert!(cell.highlight);
        assert_eq!(cell.sheet_name.as_deref(), Some("Sheet1"));
        assert_eq!(cell.doc_id, None);
    }

    #[test]
    fn test_style_parsing() {
        let style = parse_style("font-size: 9px; color: red;; : x; bad; src: url(a:b)");
        assert_eq!(style.len(), 3);
        assert_eq!(style["font-size"], "9px");
        assert_eq!(style["color"], "red");
        assert_eq!(style["src"], "url(a:b)");
    }

    #[test]
    fn test_parse_pages() {
        let pages = parse_pages(&document());
        assert_eq!(pages.len(), 2);
        let p1 = &pages["P1"];
        assert_eq!(p1.image_file.as_deref(), Some("p1.png"));
        assert_eq!(p1.word_nodes.len(), 1);
        assert_eq!(p1.word_nodes[0].v, "Invoice");
        assert_eq!(p1.word_nodes[0].style_id, Some(json!("s0")));
        assert_eq!(p1.styles["s0"]["color"], "red");
        assert!(pages["P2"].word_nodes.is_empty());
    }

    #[test]
    fn test_word_nodes_preorder() {
        let nodes = document();
        let words: Vec<&str> = word_nodes(&nodes).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(words, vec!["W1"]);
    }

    #[test]
    fn test_root_node_list() {
        let mut nodes = document();
        nodes.extend(tree(json!([
            {"id": "DB", "type": "docBuilder", "children": [
                {"id": "l1", "type": "line", "pageId": "p1", "pos": "a"},
                {"id": "l2", "type": "line", "pageId": "p2", "pos": "b"},
                {"id": "l3", "type": "line", "pageId": "p1", "pos": "c"}
            ]}
        ])));
        let roots = root_node_list(&nodes);
        assert_eq!(roots["D1"]["P1"], vec![Position { pos: Some(json!("1,1,50,5")) }]);
        assert!(roots["D1"]["P2"].is_empty());
        let builder = &roots["DB"];
        assert_eq!(builder["p1"].len(), 2);
        assert_eq!(builder["p1"][1].pos, Some(json!("c")));
        assert_eq!(builder["p2"].len(), 1);
    }
}
