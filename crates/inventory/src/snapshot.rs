//! Snapshot engine: an inventory exported to a JSON file.
//!
//! The snapshot holds activities, methods and precomputed breakdowns for
//! every project (format documented in [`crate::model`]). It is read once
//! on open; the engine never writes back.

use async_trait::async_trait;
use dopo_core::{Activity, Breakdown, EngineContext, EngineError, LcaEngine, MethodDescriptor, MethodInfo};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::Inventory;

/// A read-only engine over a JSON inventory snapshot.
#[derive(Debug)]
pub struct SnapshotEngine {
    path: PathBuf,
    inventory: Inventory,
}

impl SnapshotEngine {
    /// Load a snapshot from disk.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Storage(format!("{}: {e}", path.display())))?;
        let mut inventory: Inventory = serde_json::from_str(&content)
            .map_err(|e| EngineError::Storage(format!("{}: {e}", path.display())))?;
        inventory.prepare();

        let activities: usize = inventory
            .projects
            .values()
            .flat_map(|p| p.databases.values())
            .map(|d| d.activities.len())
            .sum();
        debug!(
            path = %path.display(),
            projects = inventory.projects.len(),
            activities,
            "Inventory snapshot loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            inventory,
        })
    }

    /// Write `inventory` as a snapshot file.
    pub fn write(inventory: &Inventory, path: &Path) -> Result<(), EngineError> {
        let json = serde_json::to_string_pretty(inventory)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| EngineError::Storage(format!("{}: {e}", path.display())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LcaEngine for SnapshotEngine {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn list_projects(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.inventory.projects.keys().cloned().collect())
    }

    async fn list_databases(&self, ctx: &EngineContext) -> Result<Vec<String>, EngineError> {
        Ok(self
            .inventory
            .project(&ctx.project)?
            .databases
            .keys()
            .cloned()
            .collect())
    }

    async fn activities(&self, ctx: &EngineContext) -> Result<Vec<Activity>, EngineError> {
        Ok(self.inventory.database(ctx)?.activities.clone())
    }

    async fn list_methods(&self, ctx: &EngineContext) -> Result<Vec<MethodInfo>, EngineError> {
        Ok(self.inventory.project(&ctx.project)?.methods.clone())
    }

    async fn compute_breakdown(
        &self,
        ctx: &EngineContext,
        activity: &Activity,
        method: &MethodDescriptor,
    ) -> Result<Breakdown, EngineError> {
        self.inventory.breakdown(ctx, activity, method)
    }
}
