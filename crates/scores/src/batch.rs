//! Batch scoring of every (sector, method) unit.
//!
//! Units are independent: each is built and aggregated on its own, up to
//! `concurrency` at a time. A failed unit is recorded and the batch moves
//! on; the outcome lists successful tables and failures side by side.

use crate::ScoreError;
use crate::aggregate::aggregate;
use crate::builder::{ScoreTableBuilder, SectorTables};
use crate::methods::SelectedMethod;
use dopo_core::ActivitySet;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// A (sector, method) unit that produced no table.
#[derive(Debug)]
pub struct UnitFailure {
    pub sector: String,
    pub method_key: String,
    pub error: ScoreError,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}: {}", self.sector, self.method_key, self.error)
    }
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Aggregated tables, `sector → method_key → table`.
    pub tables: SectorTables,
    /// Failed units, ordered by sector then method key.
    pub failures: Vec<UnitFailure>,
    /// Sectors with no matched activities.
    pub skipped: Vec<String>,
    pub units: usize,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the builder and aggregator over all units.
pub struct BatchRunner<'a> {
    builder: ScoreTableBuilder<'a>,
    cutoff: f64,
    concurrency: usize,
}

impl<'a> BatchRunner<'a> {
    pub fn new(builder: ScoreTableBuilder<'a>, cutoff: f64) -> Self {
        Self {
            builder,
            cutoff,
            concurrency: 1,
        }
    }

    /// Maximum number of units in flight; values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(
        &self,
        sets: &BTreeMap<String, ActivitySet>,
        methods: &[SelectedMethod],
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        let mut units = Vec::new();
        for (sector, activities) in sets {
            if activities.is_empty() {
                warn!(sector = %sector, "No activities matched, sector skipped");
                outcome.skipped.push(sector.clone());
                continue;
            }
            for method in methods {
                units.push((sector.as_str(), activities, method));
            }
        }
        outcome.units = units.len();

        let results: Vec<_> = stream::iter(units)
            .map(|(sector, activities, method)| async move {
                let result = self
                    .builder
                    .build_unit(sector, activities, method)
                    .await
                    .map(|table| aggregate(&table, self.cutoff));
                (sector, method, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (sector, method, result) in results {
            match result {
                Ok(table) => {
                    outcome
                        .tables
                        .entry(sector.to_string())
                        .or_default()
                        .insert(method.key.clone(), table);
                }
                Err(error) => {
                    warn!(sector, method = %method.key, error = %error, "Unit failed");
                    outcome.failures.push(UnitFailure {
                        sector: sector.to_string(),
                        method_key: method.key.clone(),
                        error,
                    });
                }
            }
        }
        outcome
            .failures
            .sort_by(|a, b| (&a.sector, &a.method_key).cmp(&(&b.sector, &b.method_key)));

        info!(
            units = outcome.units,
            succeeded = outcome.succeeded(),
            failed = outcome.failures.len(),
            skipped = outcome.skipped.len(),
            "Batch finished"
        );
        outcome
    }
}
