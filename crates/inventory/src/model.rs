//! Inventory data shared by the engine implementations.
//!
//! Serialized form (the snapshot file):
//!
//! ```json
//! {
//!   "projects": {
//!     "ecoinvent-3.9": {
//!       "methods": [{"descriptor": {"module": "IPCC 2021", "category": "climate change",
//!                                   "indicator": "GWP100"}, "unit": "kg CO2-Eq"}],
//!       "databases": {
//!         "ecoinvent-3.9.1-cutoff": {
//!           "activities": [{"key": {"database": "...", "code": "a1"}, "name": "...", ...}],
//!           "breakdowns": [{"code": "a1", "method": {...}, "total": 1.2,
//!                           "categories": {"electricity": 0.7, "clinker": 0.5}}]
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use dopo_core::{
    Activity, ActivityKey, Breakdown, EngineContext, EngineError, MethodDescriptor, MethodInfo,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Every project the engine knows about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseData {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub breakdowns: Vec<StoredBreakdown>,

    #[serde(skip)]
    index: HashMap<(String, MethodDescriptor), usize>,
}

/// A precomputed breakdown of one activity under one method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBreakdown {
    pub code: String,
    pub method: MethodDescriptor,
    #[serde(flatten)]
    pub breakdown: Breakdown,
}

impl DatabaseData {
    /// Rebuild the breakdown lookup. Later entries win over earlier ones.
    fn reindex(&mut self) {
        self.index = self
            .breakdowns
            .iter()
            .enumerate()
            .map(|(i, b)| ((b.code.clone(), b.method.clone()), i))
            .collect();
    }

    fn breakdown(&self, code: &str, method: &MethodDescriptor) -> Option<&Breakdown> {
        self.index
            .get(&(code.to_string(), method.clone()))
            .map(|&i| &self.breakdowns[i].breakdown)
    }
}

impl Inventory {
    /// Normalize after deserialization: activity keys take the name of the
    /// database that holds them, and breakdown lookups are indexed.
    pub fn prepare(&mut self) {
        for project in self.projects.values_mut() {
            for (name, db) in project.databases.iter_mut() {
                for activity in &mut db.activities {
                    if activity.key.database != *name {
                        activity.key = ActivityKey::new(name.clone(), activity.key.code.clone());
                    }
                }
                db.reindex();
            }
        }
    }

    pub fn project(&self, project: &str) -> Result<&ProjectData, EngineError> {
        self.projects
            .get(project)
            .ok_or_else(|| EngineError::UnknownProject(project.to_string()))
    }

    pub fn project_mut(&mut self, project: &str) -> &mut ProjectData {
        self.projects.entry(project.to_string()).or_default()
    }

    pub fn database(&self, ctx: &EngineContext) -> Result<&DatabaseData, EngineError> {
        let name = ctx.require_database()?;
        self.project(&ctx.project)?
            .databases
            .get(name)
            .ok_or_else(|| EngineError::UnknownDatabase {
                project: ctx.project.clone(),
                database: name.to_string(),
            })
    }

    pub fn database_mut(&mut self, project: &str, database: &str) -> &mut DatabaseData {
        self.project_mut(project)
            .databases
            .entry(database.to_string())
            .or_default()
    }

    /// Add a breakdown and keep the lookup index current.
    pub fn insert_breakdown(
        &mut self,
        project: &str,
        key: &ActivityKey,
        method: MethodDescriptor,
        breakdown: Breakdown,
    ) {
        let db = self.database_mut(project, &key.database);
        db.breakdowns.push(StoredBreakdown {
            code: key.code.clone(),
            method,
            breakdown,
        });
        db.reindex();
    }

    /// Look up the stored breakdown of `activity` under `method`.
    pub fn breakdown(
        &self,
        ctx: &EngineContext,
        activity: &Activity,
        method: &MethodDescriptor,
    ) -> Result<Breakdown, EngineError> {
        let project = self.project(&ctx.project)?;
        if !project.methods.iter().any(|m| &m.descriptor == method) {
            return Err(EngineError::UnknownMethod(method.to_string()));
        }

        // Breakdowns live with the activity's own database.
        let ctx = ctx.with_database(activity.key.database.clone());
        self.database(&ctx)?
            .breakdown(&activity.key.code, method)
            .cloned()
            .ok_or_else(|| EngineError::Computation {
                activity: activity.key.to_string(),
                method: method.to_string(),
                reason: "no breakdown available".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gwp() -> MethodDescriptor {
        MethodDescriptor::new("IPCC 2021", "climate change", "GWP100")
    }

    #[test]
    fn snapshot_json_deserializes() {
        let json = r#"{
            "projects": {
                "p": {
                    "methods": [{"descriptor": {"module": "IPCC 2021", "category": "climate change", "indicator": "GWP100"}}],
                    "databases": {
                        "ei": {
                            "activities": [{"key": {"database": "other", "code": "a1"}, "name": "steel production", "location": "DE"}],
                            "breakdowns": [{"code": "a1", "method": {"module": "IPCC 2021", "category": "climate change", "indicator": "GWP100"},
                                            "total": 2.0, "categories": {"coke": 1.5, "electricity": 0.5}}]
                        }
                    }
                }
            }
        }"#;
        let mut inv: Inventory = serde_json::from_str(json).unwrap();
        inv.prepare();

        let project = inv.project("p").unwrap();
        assert_eq!(project.methods[0].unit, "Unknown");

        let ctx = EngineContext::for_project("p").with_database("ei");
        let activity = &inv.database(&ctx).unwrap().activities[0];
        assert_eq!(activity.key.database, "ei");

        let b = inv.breakdown(&ctx, activity, &gwp()).unwrap();
        assert_eq!(b.total, 2.0);
        assert_eq!(b.categories["coke"], 1.5);
    }

    #[test]
    fn lookup_errors() {
        let mut inv = Inventory::default();
        inv.project_mut("p").methods.push(MethodInfo {
            descriptor: gwp(),
            unit: "kg CO2-Eq".into(),
        });
        let activity = Activity::new(ActivityKey::new("ei", "x"), "x", "GLO");
        inv.database_mut("p", "ei").activities.push(activity.clone());

        let ctx = EngineContext::for_project("p").with_database("ei");
        assert!(matches!(
            inv.breakdown(&ctx, &activity, &gwp()),
            Err(EngineError::Computation { .. })
        ));
        assert!(matches!(
            inv.breakdown(&ctx, &activity, &MethodDescriptor::new("a", "b", "c")),
            Err(EngineError::UnknownMethod(_))
        ));
        assert!(matches!(
            inv.database(&EngineContext::for_project("p").with_database("nope")),
            Err(EngineError::UnknownDatabase { .. })
        ));
        assert!(matches!(
            inv.project("q"),
            Err(EngineError::UnknownProject(p)) if p == "q"
        ));
    }

    #[test]
    fn later_breakdown_replaces_earlier() {
        let mut inv = Inventory::default();
        inv.project_mut("p").methods.push(MethodInfo {
            descriptor: gwp(),
            unit: "kg".into(),
        });
        let key = ActivityKey::new("ei", "a");
        inv.insert_breakdown("p", &key, gwp(), Breakdown::new(1.0));
        inv.insert_breakdown("p", &key, gwp(), Breakdown::new(5.0));

        let activity = Activity::new(key, "a", "CH");
        let ctx = EngineContext::for_project("p");
        assert_eq!(inv.breakdown(&ctx, &activity, &gwp()).unwrap().total, 5.0);
    }
}
