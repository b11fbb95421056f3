//! Score table builder.
//!
//! One table per (sector, method). Every activity of the sector's set is
//! scored through the engine; the union of all returned categories becomes
//! the column schema, with absent categories filled with 0. Rows are sorted
//! by `total` ascending, ties by activity name, location, then key.
//!
//! A unit either produces a complete table or fails: one failed or
//! inconsistent breakdown fails the whole (sector, method) unit.

use crate::ScoreError;
use crate::methods::SelectedMethod;
use dopo_core::table::totals_match;
use dopo_core::{ActivitySet, Breakdown, EngineContext, EngineError, LcaEngine, ScoreRow, ScoreTable};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// `sector → method_key → table`.
pub type SectorTables = BTreeMap<String, BTreeMap<String, ScoreTable>>;

/// Builds raw score tables through an [`LcaEngine`].
pub struct ScoreTableBuilder<'a> {
    engine: &'a dyn LcaEngine,
    ctx: EngineContext,
    tolerance: f64,
}

impl<'a> ScoreTableBuilder<'a> {
    pub fn new(engine: &'a dyn LcaEngine, ctx: EngineContext) -> Self {
        Self {
            engine,
            ctx,
            tolerance: 1e-6,
        }
    }

    /// Relative tolerance for the categories-sum-to-total check.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Build the table of one (sector, method) unit.
    pub async fn build_unit(
        &self,
        sector: &str,
        activities: &ActivitySet,
        method: &SelectedMethod,
    ) -> Result<ScoreTable, ScoreError> {
        let mut scored: Vec<(&dopo_core::Activity, Breakdown)> =
            Vec::with_capacity(activities.len());

        for activity in activities {
            let ctx = self.ctx.with_database(activity.key.database.clone());
            let breakdown = self
                .engine
                .compute_breakdown(&ctx, activity, &method.descriptor)
                .await?;

            let sum = breakdown.category_sum();
            if !totals_match(breakdown.total, sum, self.tolerance) {
                warn!(
                    sector,
                    method = %method.key,
                    activity = %activity.key,
                    total = breakdown.total,
                    sum,
                    "Inconsistent breakdown"
                );
                return Err(EngineError::Computation {
                    activity: activity.key.to_string(),
                    method: method.descriptor.to_string(),
                    reason: format!(
                        "categories sum to {sum}, total is {}",
                        breakdown.total
                    ),
                }
                .into());
            }
            scored.push((activity, breakdown));
        }

        let categories: Vec<String> = scored
            .iter()
            .flat_map(|(_, b)| b.categories.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut table = ScoreTable::new(sector, &method.key, method.descriptor.clone(), &method.unit);
        table.rows = scored
            .into_iter()
            .map(|(activity, b)| {
                let values = categories
                    .iter()
                    .map(|c| b.categories.get(c).copied().unwrap_or(0.0))
                    .collect();
                ScoreRow::for_activity(activity, b.total, values)
            })
            .collect();
        table.categories = categories;
        table.sort_by_total_asc();

        debug!(
            sector,
            method = %method.key,
            rows = table.len(),
            categories = table.categories.len(),
            "Score table built"
        );
        Ok(table)
    }

    /// Build every (sector, method) table, stopping at the first failure.
    ///
    /// Use [`crate::BatchRunner`] to keep going past failed units.
    pub async fn build(
        &self,
        sets: &BTreeMap<String, ActivitySet>,
        methods: &[SelectedMethod],
    ) -> Result<SectorTables, ScoreError> {
        let mut out = SectorTables::new();
        for (sector, activities) in sets {
            for method in methods {
                let table = self.build_unit(sector, activities, method).await?;
                out.entry(sector.clone())
                    .or_default()
                    .insert(method.key.clone(), table);
            }
        }
        Ok(out)
    }
}
