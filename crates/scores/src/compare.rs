//! Relative change between two databases' score tables.
//!
//! Rows are matched by activity code (the same process in, e.g., ecoinvent
//! and a premise-generated database keeps its code). For each match:
//!
//! ```text
//! relative_change = (other - base) / base * 100
//! ```
//!
//! With `base == 0` the change is `+inf` when `other` differs and `0`
//! otherwise.

use crate::ScoreError;
use crate::builder::SectorTables;
use dopo_core::{ActivityKey, MethodDescriptor, ScoreTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One matched activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeChange {
    pub code: String,
    pub activity: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_product: Option<String>,
    pub base_total: f64,
    pub other_total: f64,
    pub relative_change: f64,
    /// Dense rank, 1 = largest increase.
    pub rank: usize,
}

/// Comparison of one (sector, method) unit across two databases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub sector: String,
    pub method_key: String,
    pub method: MethodDescriptor,
    pub method_unit: String,
    pub changes: Vec<RelativeChange>,
    /// Activities present in only one of the tables.
    pub unmatched: Vec<ActivityKey>,
}

/// `(other - base) / base * 100`, with the zero-base rule.
pub fn relative_change(base: f64, other: f64) -> f64 {
    if base == 0.0 {
        if other != base { f64::INFINITY } else { 0.0 }
    } else {
        (other - base) / base * 100.0
    }
}

/// Compare two tables of the same sector and method.
pub fn compare_databases(base: &ScoreTable, other: &ScoreTable) -> Result<Comparison, ScoreError> {
    if base.sector != other.sector || base.method != other.method {
        return Err(ScoreError::Mismatch(format!(
            "{}/{} vs {}/{}",
            base.sector, base.method, other.sector, other.method
        )));
    }

    let other_by_code: BTreeMap<&str, usize> = other
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.key.code.as_str(), i))
        .collect();

    let mut changes = Vec::new();
    let mut unmatched = Vec::new();
    let mut matched_other = vec![false; other.rows.len()];

    for row in &base.rows {
        let Some(&j) = other_by_code.get(row.key.code.as_str()) else {
            unmatched.push(row.key.clone());
            continue;
        };
        matched_other[j] = true;
        let o = &other.rows[j];
        changes.push(RelativeChange {
            code: row.key.code.clone(),
            activity: row.activity.clone(),
            location: row.location.clone(),
            reference_product: row.reference_product.clone(),
            base_total: row.total,
            other_total: o.total,
            relative_change: relative_change(row.total, o.total),
            rank: 0,
        });
    }
    unmatched.extend(
        other
            .rows
            .iter()
            .zip(&matched_other)
            .filter(|(_, m)| !**m)
            .map(|(r, _)| r.key.clone()),
    );

    changes.sort_by(|a, b| {
        b.relative_change
            .total_cmp(&a.relative_change)
            .then_with(|| a.code.cmp(&b.code))
    });
    let mut rank = 0;
    let mut previous: Option<f64> = None;
    for change in &mut changes {
        if previous != Some(change.relative_change) {
            rank += 1;
            previous = Some(change.relative_change);
        }
        change.rank = rank;
    }

    debug!(
        sector = %base.sector,
        method = %base.method_key,
        matched = changes.len(),
        unmatched = unmatched.len(),
        "Databases compared"
    );

    Ok(Comparison {
        sector: base.sector.clone(),
        method_key: base.method_key.clone(),
        method: base.method.clone(),
        method_unit: base.method_unit.clone(),
        changes,
        unmatched,
    })
}

/// Compare every (sector, method) unit present in both table sets.
pub fn compare_all(base: &SectorTables, other: &SectorTables) -> Result<Vec<Comparison>, ScoreError> {
    let mut out = Vec::new();
    for (sector, methods) in base {
        let Some(other_methods) = other.get(sector) else {
            continue;
        };
        for (key, table) in methods {
            if let Some(other_table) = other_methods.get(key) {
                out.push(compare_databases(table, other_table)?);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dopo_core::ScoreRow;

    fn table(db: &str, rows: &[(&str, f64)]) -> ScoreTable {
        let mut t = ScoreTable::new(
            "steel",
            "gwp",
            MethodDescriptor::new("IPCC 2021", "climate change", "GWP100"),
            "kg CO2-Eq",
        );
        t.rows = rows
            .iter()
            .map(|(code, total)| ScoreRow {
                key: ActivityKey::new(db, *code),
                activity: format!("steel {code}"),
                reference_product: Some("steel".into()),
                location: "DE".into(),
                unit: "kilogram".into(),
                total: *total,
                values: vec![],
            })
            .collect();
        t
    }

    #[test]
    fn zero_base_rule() {
        assert_eq!(relative_change(0.0, 0.0), 0.0);
        assert_eq!(relative_change(0.0, 1.0), f64::INFINITY);
        assert_eq!(relative_change(0.0, -1.0), f64::INFINITY);
        assert_eq!(relative_change(2.0, 3.0), 50.0);
        assert_eq!(relative_change(2.0, 1.0), -50.0);
    }

    #[test]
    fn matched_by_code_and_dense_ranked() {
        let base = table("ei", &[("a", 2.0), ("b", 4.0), ("c", 1.0), ("d", 0.0), ("x", 9.0)]);
        let other = table("premise", &[("a", 3.0), ("b", 6.0), ("c", 0.5), ("d", 0.5), ("y", 1.0)]);
        let cmp = compare_databases(&base, &other).unwrap();

        let summary: Vec<(&str, f64, usize)> = cmp
            .changes
            .iter()
            .map(|c| (c.code.as_str(), c.relative_change, c.rank))
            .collect();
        assert_eq!(
            summary,
            [
                ("d", f64::INFINITY, 1),
                ("a", 50.0, 2),
                ("b", 50.0, 2),
                ("c", -50.0, 3),
            ]
        );
        assert_eq!(
            cmp.unmatched,
            [ActivityKey::new("ei", "x"), ActivityKey::new("premise", "y")]
        );
    }

    #[test]
    fn different_methods_cannot_be_compared() {
        let base = table("ei", &[]);
        let mut other = table("premise", &[]);
        other.method = MethodDescriptor::new("ReCiPe", "water", "WCP");
        assert!(matches!(
            compare_databases(&base, &other),
            Err(ScoreError::Mismatch(_))
        ));
    }

    #[test]
    fn compare_all_skips_missing_units() {
        let mut base = SectorTables::new();
        base.entry("steel".into()).or_default().insert("gwp".into(), table("ei", &[("a", 1.0)]));
        base.entry("cement".into()).or_default().insert("gwp".into(), table("ei", &[]));
        let mut other = SectorTables::new();
        other
            .entry("steel".into())
            .or_default()
            .insert("gwp".into(), table("premise", &[("a", 2.0)]));

        let all = compare_all(&base, &other).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].changes[0].relative_change, 100.0);
    }
}
