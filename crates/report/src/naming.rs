//! Worksheet names.
//!
//! Spreadsheet sheet names are at most 31 characters, may not contain
//! `[ ] : * ? / \`, and are unique ignoring case.

use tracing::{debug, warn};

pub const MAX_SHEET_NAME: usize = 31;

const ILLEGAL: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Replace illegal characters with `_` and truncate to the length limit.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = if cleaned.is_empty() { "sheet".to_string() } else { cleaned };
    truncate(&cleaned, MAX_SHEET_NAME)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Hands out unique sheet names in request order.
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: Vec<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn taken(&self, name: &str) -> bool {
        self.used.iter().any(|u| u.eq_ignore_ascii_case(name))
    }

    /// A unique name for `raw`. Collisions get `_1`, `_2`, ... with the
    /// base shortened so the result still fits.
    pub fn name(&mut self, raw: &str) -> String {
        let base = sanitize(raw);
        if base.chars().count() < raw.trim().chars().count() {
            debug!(raw, name = %base, "Sheet name truncated");
        }

        let mut name = base.clone();
        let mut n = 0;
        while self.taken(&name) {
            n += 1;
            let suffix = format!("_{n}");
            let keep = MAX_SHEET_NAME - suffix.len();
            name = format!("{}{suffix}", truncate(&base, keep));
        }
        if n > 0 {
            warn!(raw, name = %name, "Sheet name collision resolved with suffix");
        }

        self.used.push(name.clone());
        name
    }

    pub fn names(&self) -> &[String] {
        &self.used
    }
}
