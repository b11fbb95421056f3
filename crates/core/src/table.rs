//! Score tables: one row per activity for one (sector, method) pair.
//!
//! Column layout is fixed: identity columns, then `total`, then one column
//! per contribution category. Derived statistics are added later by the
//! report layer, immediately after `total`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::activity::{Activity, ActivityKey};
use crate::method::MethodDescriptor;

pub const TOTAL_COLUMN: &str = "total";
pub const OTHER_COLUMN: &str = "other";

/// Identity columns, in output order.
pub const IDENTITY_COLUMNS: [&str; 8] = [
    "activity",
    "database",
    "code",
    "reference product",
    "location",
    "unit",
    "method",
    "method unit",
];

/// One activity's scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub key: ActivityKey,
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_product: Option<String>,
    pub location: String,
    pub unit: String,
    pub total: f64,
    /// Contribution values, aligned with [`ScoreTable::categories`].
    pub values: Vec<f64>,
}

impl ScoreRow {
    pub fn for_activity(activity: &Activity, total: f64, values: Vec<f64>) -> Self {
        Self {
            key: activity.key.clone(),
            activity: activity.name.clone(),
            reference_product: activity.reference_product.clone(),
            location: activity.location.clone(),
            unit: activity.unit.clone(),
            total,
            values,
        }
    }

    /// Sum of the contribution values.
    pub fn contribution_sum(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// A rectangular score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub sector: String,
    pub method_key: String,
    pub method: MethodDescriptor,
    pub method_unit: String,
    pub categories: Vec<String>,
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn new(
        sector: impl Into<String>,
        method_key: impl Into<String>,
        method: MethodDescriptor,
        method_unit: impl Into<String>,
    ) -> Self {
        Self {
            sector: sector.into(),
            method_key: method_key.into(),
            method,
            method_unit: method_unit.into(),
            categories: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identity columns, `total`, then categories.
    pub fn column_names(&self) -> Vec<String> {
        IDENTITY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(std::iter::once(TOTAL_COLUMN.to_string()))
            .chain(self.categories.iter().cloned())
            .collect()
    }

    pub fn category_index(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }

    pub fn has_other(&self) -> bool {
        self.category_index(OTHER_COLUMN).is_some()
    }

    /// Value of `category` in row `row`; categories absent from the table are 0.
    pub fn value(&self, row: usize, category: &str) -> Option<f64> {
        let r = self.rows.get(row)?;
        Some(
            self.category_index(category)
                .and_then(|i| r.values.get(i).copied())
                .unwrap_or(0.0),
        )
    }

    /// All values of one category column.
    pub fn column(&self, category: &str) -> Option<Vec<f64>> {
        let idx = self.category_index(category)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    pub fn totals(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total).collect()
    }

    /// Rows whose contributions do not sum to `total` within `tolerance`
    /// (relative to `max(|total|, 1)`).
    pub fn inconsistent_rows(&self, tolerance: f64) -> Vec<&ScoreRow> {
        self.rows
            .iter()
            .filter(|r| !totals_match(r.total, r.contribution_sum(), tolerance))
            .collect()
    }

    /// Sort rows by `total` descending; ties by activity then location.
    pub fn sort_by_total_desc(&mut self) {
        self.rows.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| tie_break(a, b))
        });
    }

    /// Sort rows by `total` ascending; ties by activity then location.
    pub fn sort_by_total_asc(&mut self) {
        self.rows.sort_by(|a, b| {
            a.total
                .total_cmp(&b.total)
                .then_with(|| tie_break(a, b))
        });
    }
}

fn tie_break(a: &ScoreRow, b: &ScoreRow) -> Ordering {
    a.activity
        .cmp(&b.activity)
        .then_with(|| a.location.cmp(&b.location))
        .then_with(|| a.key.cmp(&b.key))
}

/// Relative float comparison used for total-preservation checks.
pub fn totals_match(expected: f64, actual: f64, tolerance: f64) -> bool {
    (expected - actual).abs() <= tolerance * expected.abs().max(1.0)
}
