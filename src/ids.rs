//! Hierarchical id decomposition.
//!
//! Transaction-scoped ids look like `T<..>.<..>.<batch>.<..>.<doc>.<key>.<item>[.<child>]`;
//! legacy ids drop the two transaction segments.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitId {
    pub transaction_id: Option<String>,
    pub batch_id: String,
    pub document_id: String,
    pub key_id: String,
    pub key_item_id: String,
    pub key_item_child_id: Option<String>,
}

/// Split `id` into its ancestor ids. Returns `None` when the id has fewer
/// segments than its layout requires.
pub fn split_id(id: &str) -> Option<SplitId> {
    let parts: Vec<&str> = id.split('.').collect();
    let transaction_scoped = parts.first().is_some_and(|p| p.starts_with('T'));

    let (transaction_id, rest) = if transaction_scoped {
        if parts.len() < 7 {
            return None;
        }
        (Some(format!("{}.{}", parts[0], parts[1])), &parts[2..])
    } else {
        if parts.len() < 5 {
            return None;
        }
        (None, &parts[..])
    };

    let batch_id = format!("{}.{}", rest[0], rest[1]);
    let document_id = format!("{}.{}", batch_id, rest[2]);
    let key_id = format!("{}.{}", document_id, rest[3]);
    let key_item_id = format!("{}.{}", key_id, rest[4]);
    let key_item_child_id = (rest.len() == 6).then(|| format!("{}.{}", key_item_id, rest[5]));

    Some(SplitId {
        transaction_id,
        batch_id,
        document_id,
        key_id,
        key_item_id,
        key_item_child_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_layout() {
        let split = split_id("M20240101.US1.D1.K1.I1").unwrap();
        assert_eq!(split.transaction_id, None);
        assert_eq!(split.batch_id, "M20240101.US1");
        assert_eq!(split.document_id, "M20240101.US1.D1");
        assert_eq!(split.key_id, "M20240101.US1.D1.K1");
        assert_eq!(split.key_item_id, "M20240101.US1.D1.K1.I1");
        assert_eq!(split.key_item_child_id, None);

        let child = split_id("M20240101.US1.D1.K1.I1.C1").unwrap();
        assert_eq!(child.key_item_child_id.as_deref(), Some("M20240101.US1.D1.K1.I1.C1"));
    }

    #[test]
    fn test_transaction_layout() {
        let split = split_id("T2024.5.M20240101.US1.D1.K1.I1.C9").unwrap();
        assert_eq!(split.transaction_id.as_deref(), Some("T2024.5"));
        assert_eq!(split.batch_id, "M20240101.US1");
        assert_eq!(split.document_id, "M20240101.US1.D1");
        assert_eq!(split.key_item_child_id.as_deref(), Some("M20240101.US1.D1.K1.I1.C9"));
    }

    #[test]
    fn test_short_ids_are_rejected() {
        assert_eq!(split_id("M20240101.US1.D1"), None);
        assert_eq!(split_id("T1.2.M1.US1.D1.K1"), None);
        assert_eq!(split_id(""), None);
    }
}
