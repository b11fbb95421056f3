//! Activity filters: declarative selections of LCA activities.
//!
//! Sector mapping files name technologies and describe which database
//! activities belong to them. Each entry has an inclusion predicate
//! (`fltr`) and an optional exclusion predicate (`mask`):
//!
//! ```yaml
//! cement, dry feed rotary kiln:
//!   ecoinvent_aliases:
//!     fltr:
//!       name: [cement production, clinker production]
//!       location: CH
//!     mask: market for
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Mapping file │───▶│ FilterEngine │───▶│ ActivitySet  │
//! │ (FilterSpec) │    │  (compiled)  │    │ per tech     │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Composition rules: values listed for one field are OR-combined, fields
//! are AND-combined, and `mask` is subtracted from the `fltr` result.

mod engine;
mod model;

pub use dopo_core::FilterError;
pub use engine::{FilterEngine, generate_sets_from_filters, match_activities};
pub use model::{CompiledFilter, FieldPredicate, FieldValues, FilterSpec, Predicate, PredicateSpec};

/// Re-export for convenience.
pub type FilterResult<T> = std::result::Result<T, FilterError>;
