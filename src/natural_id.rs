//! Natural ordering for document and batch ids of the form `M<yyyymmdd>.US<seq>`.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::schema::{Node, NodeType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^M(\d{8})\.US(\d+)").expect("natural id pattern is valid"))
}

/// Sort key for an id. Ids outside the pattern key as date 0, seq 0 and
/// therefore lead in ascending order.
#[derive(Debug, PartialEq, Eq)]
struct DocKey<'a> {
    raw: &'a str,
    date: u64,
    seq: u128,
}

fn doc_key(id: &str) -> DocKey<'_> {
    match id_pattern().captures(id) {
        Some(caps) => DocKey {
            raw: id,
            date: caps[1].parse().unwrap_or(0),
            seq: caps[2].parse().unwrap_or(u128::MAX),
        },
        None => DocKey {
            raw: id,
            date: 0,
            seq: 0,
        },
    }
}

/// Compare two ids by (date, seq, raw string).
pub fn compare_ids(a: &str, b: &str, order: SortOrder) -> Ordering {
    let (ak, bk) = (doc_key(a), doc_key(b));
    let ascending = ak
        .date
        .cmp(&bk.date)
        .then(ak.seq.cmp(&bk.seq))
        .then_with(|| ak.raw.cmp(bk.raw));
    match order {
        SortOrder::Asc => ascending,
        SortOrder::Desc => ascending.reverse(),
    }
}

/// Reorder `document` and `batch` siblings among the slots they already
/// occupy; every other node keeps its position.
pub fn sort_for_display<'n>(nodes: &[&'n Node], order: SortOrder) -> Vec<&'n Node> {
    let sorted_of = |node_type: NodeType| {
        let mut picked: Vec<&'n Node> = nodes
            .iter()
            .copied()
            .filter(|n| n.node_type == node_type)
            .collect();
        picked.sort_by(|a, b| compare_ids(&a.id, &b.id, order));
        picked.into_iter()
    };
    let mut documents = sorted_of(NodeType::Document);
    let mut batches = sorted_of(NodeType::Batch);

    nodes
        .iter()
        .map(|&n| match n.node_type {
            NodeType::Document => documents.next().unwrap_or(n),
            NodeType::Batch => batches.next().unwrap_or(n),
            _ => n,
        })
        .collect()
}
