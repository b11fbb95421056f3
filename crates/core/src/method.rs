//! Impact-assessment method descriptors.
//!
//! A method is identified by a three-part name such as
//! `("IPCC 2021", "climate change", "global warming potential (GWP100)")`.
//! Descriptors are parsed from text by [`MethodDescriptor::from_str`]; the
//! text is never executed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Typed three-part method name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub module: String,
    pub category: String,
    pub indicator: String,
}

impl MethodDescriptor {
    pub fn new(
        module: impl Into<String>,
        category: impl Into<String>,
        indicator: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            category: category.into(),
            indicator: indicator.into(),
        }
    }

    /// The indicator name, used as the `method` identity column.
    pub fn short_name(&self) -> &str {
        &self.indicator
    }

    /// Lowercase, underscore-joined indicator (`"GWP 100a"` → `"gwp_100a"`).
    pub fn slug(&self) -> String {
        self.indicator.replace(' ', "_").to_lowercase()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.module, self.category, self.indicator)
    }
}

impl FromStr for MethodDescriptor {
    type Err = String;

    /// Accepts `module | category | indicator` or a tuple literal
    /// `('module', 'category', 'indicator')`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts = if trimmed.starts_with('(') {
            parse_tuple_literal(trimmed)?
        } else {
            trimmed.split('|').map(|p| p.trim().to_string()).collect()
        };

        match <[String; 3]>::try_from(parts) {
            Ok([module, category, indicator]) => {
                if module.is_empty() || category.is_empty() || indicator.is_empty() {
                    return Err(format!("method name has an empty component: {trimmed}"));
                }
                Ok(Self {
                    module,
                    category,
                    indicator,
                })
            }
            Err(parts) => Err(format!(
                "expected 3 method name components, got {}: {trimmed}",
                parts.len()
            )),
        }
    }
}

/// Parse `('a', "b", 'c')` into its quoted string items.
fn parse_tuple_literal(s: &str) -> Result<Vec<String>, String> {
    let inner = s
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| format!("unbalanced parentheses in method name: {s}"))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(quote) = chars.next() else { break };
        if quote != '\'' && quote != '"' {
            return Err(format!("expected quoted string in method name: {s}"));
        }
        let mut item = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    item.push(escaped);
                }
            } else if c == quote {
                closed = true;
                break;
            } else {
                item.push(c);
            }
        }
        if !closed {
            return Err(format!("unterminated string in method name: {s}"));
        }
        items.push(item);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some(',') | None => {}
            Some(other) => return Err(format!("unexpected '{other}' in method name: {s}")),
        }
    }
    Ok(items)
}

/// A method offered by the engine, with its score unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub descriptor: MethodDescriptor,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "Unknown".into()
}
