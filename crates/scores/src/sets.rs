//! Activity sets per sector, across one or more databases.

use crate::ScoreError;
use dopo_core::{Activity, ActivitySet, EngineContext, FilterError, LcaEngine};
use dopo_filters::{FilterEngine, FilterSpec};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Matched activities, `sector → technology → set`.
///
/// Sets of the same technology found in different databases are unioned.
#[derive(Debug, Clone, Default)]
pub struct SectorSets {
    pub technologies: BTreeMap<String, BTreeMap<String, ActivitySet>>,
    /// Sectors whose filters could not be evaluated.
    pub failed: BTreeMap<String, FilterError>,
}

impl SectorSets {
    /// Union of all technology sets of one sector.
    pub fn sector(&self, sector: &str) -> ActivitySet {
        self.technologies
            .get(sector)
            .map(|techs| {
                techs
                    .values()
                    .fold(ActivitySet::new(), |acc, set| acc.union(set))
            })
            .unwrap_or_default()
    }

    /// `sector → union of its technology sets`.
    pub fn by_sector(&self) -> BTreeMap<String, ActivitySet> {
        self.technologies
            .keys()
            .map(|s| (s.clone(), self.sector(s)))
            .collect()
    }
}

/// Evaluate every sector's mapping against the activities of `databases`
/// (all databases of the project when empty).
///
/// Filter errors abort only the sector they occur in; engine errors abort
/// the whole collection.
pub async fn collect_sector_sets(
    engine: &dyn LcaEngine,
    ctx: &EngineContext,
    databases: &[String],
    mappings: &BTreeMap<String, BTreeMap<String, FilterSpec>>,
) -> Result<SectorSets, ScoreError> {
    let databases = if databases.is_empty() {
        engine.list_databases(ctx).await?
    } else {
        databases.to_vec()
    };

    let mut inventories: Vec<(String, Vec<Activity>)> = Vec::with_capacity(databases.len());
    for db in &databases {
        let activities = engine.activities(&ctx.with_database(db.clone())).await?;
        info!(database = %db, activities = activities.len(), "Activities loaded");
        inventories.push((db.clone(), activities));
    }

    let mut out = SectorSets::default();
    for (sector, mapping) in mappings {
        match sector_sets(mapping, &inventories) {
            Ok(techs) => {
                out.technologies.insert(sector.clone(), techs);
            }
            Err(e) => {
                warn!(sector = %sector, error = %e, "Sector skipped");
                out.failed.insert(sector.clone(), e);
            }
        }
    }
    Ok(out)
}

fn sector_sets(
    mapping: &BTreeMap<String, FilterSpec>,
    inventories: &[(String, Vec<Activity>)],
) -> Result<BTreeMap<String, ActivitySet>, FilterError> {
    let filters = FilterEngine::new(mapping)?;
    let mut techs: BTreeMap<String, ActivitySet> = BTreeMap::new();
    for (_, activities) in inventories {
        for (tech, set) in filters.generate_sets(activities)? {
            let merged = match techs.remove(&tech) {
                Some(existing) => existing.union(&set),
                None => set,
            };
            techs.insert(tech, merged);
        }
    }
    Ok(techs)
}
