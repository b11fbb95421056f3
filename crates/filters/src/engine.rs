//! Filter evaluation engine.
//!
//! Evaluation narrows a candidate list field by field:
//!
//! ```text
//! candidates = all activities
//! for each fltr field:  keep activities whose field contains ANY value
//! for each mask field:  drop activities whose field contains ANY value
//! ```
//!
//! Matching is substring containment. It is not anchored at the start of
//! the field, even though older mapping files describe `fltr` strings as
//! "startswith" patterns.
//!
//! Fields are only read from activities that are still candidates, so a
//! missing field surfaces as [`FilterError::FieldAccess`] only when an
//! activity reaches that check.

use crate::model::{CompiledFilter, FilterSpec, Predicate, PredicateSpec};
use dopo_core::{Activity, ActivitySet, FilterError};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Select the activities matching `fltr` and not matching `mask`.
pub fn match_activities(
    activities: &[Activity],
    fltr: &PredicateSpec,
    mask: Option<&PredicateSpec>,
) -> Result<ActivitySet, FilterError> {
    let spec = FilterSpec {
        fltr: Some(fltr.clone()),
        mask: mask.cloned(),
    };
    let compiled = spec.compile("(inline)")?;
    compiled.select(activities)
}

impl CompiledFilter {
    /// Apply this filter to a collection of activities.
    pub fn select(&self, activities: &[Activity]) -> Result<ActivitySet, FilterError> {
        let mut candidates: Vec<&Activity> = activities.iter().collect();

        for fp in &self.include.fields {
            candidates = retain(candidates, |a| fp.matches(a))?;
        }
        for fp in &self.exclude.fields {
            candidates = retain(candidates, |a| fp.matches(a).map(|hit| !hit))?;
        }

        debug!(
            filter = %self.name,
            matched = candidates.len(),
            of = activities.len(),
            "Filter evaluated"
        );
        Ok(candidates.into_iter().cloned().collect())
    }

    /// The names mentioned in the inclusion predicate's `name` field.
    pub fn name_terms(&self) -> Vec<&str> {
        name_terms(&self.include)
    }
}

fn name_terms(p: &Predicate) -> Vec<&str> {
    p.fields
        .iter()
        .filter(|f| f.field == "name")
        .flat_map(|f| f.values.iter().map(String::as_str))
        .collect()
}

fn retain<'a>(
    candidates: Vec<&'a Activity>,
    mut keep: impl FnMut(&Activity) -> Result<bool, FilterError>,
) -> Result<Vec<&'a Activity>, FilterError> {
    let mut out = Vec::with_capacity(candidates.len());
    for a in candidates {
        if keep(a)? {
            out.push(a);
        }
    }
    Ok(out)
}

/// A set of compiled filters keyed by technology name.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    filters: BTreeMap<String, CompiledFilter>,
}

impl FilterEngine {
    /// Compile every specification in a mapping. The first invalid entry
    /// aborts construction.
    pub fn new(mapping: &BTreeMap<String, FilterSpec>) -> Result<Self, FilterError> {
        let mut filters = BTreeMap::new();
        for (name, spec) in mapping {
            filters.insert(name.clone(), spec.compile(name)?);
        }
        Ok(Self { filters })
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&CompiledFilter> {
        self.filters.get(name)
    }

    /// Build one activity set per technology.
    pub fn generate_sets(
        &self,
        activities: &[Activity],
    ) -> Result<BTreeMap<String, ActivitySet>, FilterError> {
        let mut sets = BTreeMap::new();
        for (name, filter) in &self.filters {
            let set = filter.select(activities)?;
            if set.is_empty() {
                info!(technology = %name, "Filter matched no activities");
            }
            sets.insert(name.clone(), set);
        }
        Ok(sets)
    }
}

/// Convenience wrapper: compile `mapping` and evaluate it in one step.
pub fn generate_sets_from_filters(
    mapping: &BTreeMap<String, FilterSpec>,
    activities: &[Activity],
) -> Result<BTreeMap<String, ActivitySet>, FilterError> {
    FilterEngine::new(mapping)?.generate_sets(activities)
}
