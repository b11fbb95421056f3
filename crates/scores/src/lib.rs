//! Scoring for dopo: from activity sets to aggregated score tables.
//!
//! ```text
//! mapping ──▶ sets ──▶ ScoreTableBuilder ──▶ aggregate ──▶ ScoreTable
//!                        (LcaEngine)          (cutoff)
//! ```
//!
//! [`BatchRunner`] drives every (sector, method) unit, optionally in
//! parallel, and collects failed units instead of aborting.

pub mod aggregate;
pub mod batch;
pub mod builder;
pub mod compare;
pub mod methods;
pub mod sets;
pub mod statistics;

pub use aggregate::{aggregate, is_unnamed_category};
pub use batch::{BatchOutcome, BatchRunner, UnitFailure};
pub use builder::{ScoreTableBuilder, SectorTables};
pub use compare::{Comparison, RelativeChange, compare_all, compare_databases, relative_change};
pub use methods::{MethodFinder, SelectedMethod};
pub use sets::{SectorSets, collect_sector_sets};
pub use statistics::{STATISTIC_COLUMNS, TableStatistics};

use dopo_core::{EngineError, FilterError};

/// Errors from the scoring subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("no method matches criteria {criteria:?} (excluding {exclude:?})")]
    NoMethodFound {
        criteria: Vec<String>,
        exclude: Vec<String>,
    },

    #[error("{} methods match criteria {criteria:?}, be more specific: {}", .candidates.len(), .candidates.join("; "))]
    AmbiguousMethod {
        criteria: Vec<String>,
        candidates: Vec<String>,
    },

    #[error("method key '{0}' is already in use")]
    DuplicateMethodKey(String),

    #[error("tables cannot be compared: {0}")]
    Mismatch(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
