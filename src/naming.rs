//! Label casing helpers for key names.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn word_start() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w|[A-Z]|\b\w").expect("word start pattern is valid"))
}

fn capital() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([A-Z])").expect("capital pattern is valid"))
}

/// `"Invoice Number"` → `"invoiceNumber"`.
pub fn to_camel_case(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let cased = word_start().replace_all(s, |caps: &Captures| {
        let m = &caps[0];
        if caps.get(0).map_or(0, |g| g.start()) == 0 {
            m.to_lowercase()
        } else {
            m.to_uppercase()
        }
    });
    let joined: String = cased.split_whitespace().collect();
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"invoiceNumber"` → `"Invoice Number"`. Strings that already contain a
/// space are returned unchanged.
pub fn to_normal_case(s: &str) -> String {
    if s.is_empty() || s.contains(' ') {
        return s.to_string();
    }
    let spaced = capital().replace_all(s, " $1");
    crate::schema::capitalize(&spaced).trim().to_string()
}
