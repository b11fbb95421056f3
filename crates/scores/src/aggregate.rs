//! Small-contribution aggregation.
//!
//! Per row, with `threshold = |total| * cutoff`:
//!
//! 1. categories without a usable name (`None`, empty, `Unnamed...`) are
//!    folded into `other` unconditionally;
//! 2. every other contribution with `|value| < threshold` is added (signed)
//!    to `other` and zeroed;
//! 3. contribution columns that are zero in every row are dropped;
//! 4. rows are re-sorted by `total` descending.
//!
//! `other` is never itself a candidate, so a second pass changes nothing.
//! With `total == 0` the threshold is 0 and nothing moves.

use dopo_core::{OTHER_COLUMN, ScoreRow, ScoreTable};
use tracing::debug;

/// Whether a category label carries no usable name.
pub fn is_unnamed_category(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || label == "None" || label.starts_with("Unnamed")
}

/// Collapse contributions below `cutoff` (a share of each row's total) into `other`.
pub fn aggregate(table: &ScoreTable, cutoff: f64) -> ScoreTable {
    let other_idx = table.category_index(OTHER_COLUMN);

    let mut kept: Vec<usize> = Vec::new();
    let mut folded: Vec<usize> = Vec::new();
    for (i, name) in table.categories.iter().enumerate() {
        if Some(i) == other_idx {
            continue;
        }
        if is_unnamed_category(name) {
            folded.push(i);
        } else {
            kept.push(i);
        }
    }

    // Per row: kept values followed by `other`.
    let rows: Vec<(Vec<f64>, f64)> = table
        .rows
        .iter()
        .map(|row| {
            let threshold = row.total.abs() * cutoff;
            let mut other = other_idx.map(|i| row.values[i]).unwrap_or(0.0);
            other += folded.iter().map(|&i| row.values[i]).sum::<f64>();

            let values = kept
                .iter()
                .map(|&i| {
                    let v = row.values[i];
                    if v.abs() < threshold {
                        other += v;
                        0.0
                    } else {
                        v
                    }
                })
                .collect();
            (values, other)
        })
        .collect();

    let live: Vec<usize> = (0..kept.len())
        .filter(|&c| rows.iter().any(|(values, _)| values[c] != 0.0))
        .collect();

    let mut out = ScoreTable::new(
        table.sector.clone(),
        table.method_key.clone(),
        table.method.clone(),
        table.method_unit.clone(),
    );
    out.categories = live
        .iter()
        .map(|&c| table.categories[kept[c]].clone())
        .chain(std::iter::once(OTHER_COLUMN.to_string()))
        .collect();
    out.rows = table
        .rows
        .iter()
        .zip(rows)
        .map(|(row, (values, other))| {
            let mut v: Vec<f64> = live.iter().map(|&c| values[c]).collect();
            v.push(other);
            ScoreRow {
                values: v,
                ..row.clone()
            }
        })
        .collect();
    out.sort_by_total_desc();

    debug!(
        sector = %table.sector,
        method = %table.method_key,
        cutoff,
        before = table.categories.len(),
        after = out.categories.len(),
        "Small contributions aggregated"
    );
    out
}
