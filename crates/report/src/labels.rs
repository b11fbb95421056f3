//! Column label cleaning.
//!
//! Contribution categories usually carry their classification code
//! (`"23: cement"`). Exported labels drop the leading code.

use regex_lite::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::warn;

static CODE_PREFIX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d+:\s*").ok());

/// `"23: cement"` → `"cement"`. Labels without a code are returned unchanged.
pub fn clean_label(label: &str) -> String {
    match CODE_PREFIX.as_ref() {
        Some(re) => re.replace(label, "").into_owned(),
        None => label.to_string(),
    }
}

/// Clean every label. A label keeps its original text when the cleaned form
/// would duplicate a reserved column or an earlier label; if that is taken
/// too, it gets a `_1`, `_2`, ... suffix. The result never repeats a name.
pub fn clean_labels(labels: &[String], reserved: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = reserved.iter().cloned().collect();
    labels
        .iter()
        .map(|label| {
            let cleaned = clean_label(label);
            let chosen = if !cleaned.is_empty() && !seen.contains(&cleaned) {
                cleaned
            } else if !seen.contains(label) {
                label.clone()
            } else {
                let chosen = (1..)
                    .map(|n| format!("{label}_{n}"))
                    .find(|candidate| !seen.contains(candidate))
                    .unwrap_or_default();
                warn!(label = %label, column = %chosen, "Contribution label renamed");
                chosen
            };
            seen.insert(chosen.clone());
            chosen
        })
        .collect()
}
