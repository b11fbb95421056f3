//! In-memory engine: useful for testing and small programmatic inventories.

use async_trait::async_trait;
use dopo_core::{
    Activity, ActivityKey, Breakdown, EngineContext, EngineError, LcaEngine, MethodDescriptor,
    MethodInfo,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::model::Inventory;

/// An engine whose projects, activities and breakdowns are set up in code.
///
/// Breakdowns are fixed values; nothing is actually computed. Selected
/// (activity, method) pairs can be made to fail, and an artificial latency
/// makes concurrent behaviour observable in tests.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    inventory: Inventory,
    failures: BTreeSet<(ActivityKey, MethodDescriptor)>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing inventory.
    pub fn from_inventory(mut inventory: Inventory) -> Self {
        inventory.prepare();
        Self {
            inventory,
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project: &str) -> Self {
        self.inventory.project_mut(project);
        self
    }

    pub fn with_database(mut self, project: &str, database: &str) -> Self {
        self.inventory.database_mut(project, database);
        self
    }

    /// Add an activity to `project`, in the database named by its key.
    pub fn with_activity(mut self, project: &str, activity: Activity) -> Self {
        self.inventory
            .database_mut(project, &activity.key.database)
            .activities
            .push(activity);
        self
    }

    pub fn with_method(mut self, project: &str, descriptor: MethodDescriptor, unit: &str) -> Self {
        self.inventory.project_mut(project).methods.push(MethodInfo {
            descriptor,
            unit: unit.to_string(),
        });
        self
    }

    pub fn with_breakdown(
        mut self,
        project: &str,
        key: &ActivityKey,
        method: &MethodDescriptor,
        breakdown: Breakdown,
    ) -> Self {
        self.inventory
            .insert_breakdown(project, key, method.clone(), breakdown);
        self
    }

    /// Make `compute_breakdown` fail for this (activity, method) pair.
    pub fn with_failure(mut self, key: &ActivityKey, method: &MethodDescriptor) -> Self {
        self.failures.insert((key.clone(), method.clone()));
        self
    }

    /// Delay every `compute_breakdown` call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `compute_breakdown` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of `compute_breakdown` calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LcaEngine for InMemoryEngine {
    fn name(&self) -> &str {
        "in_memory"
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
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self
            .failures
            .contains(&(activity.key.clone(), method.clone()))
        {
            return Err(EngineError::Computation {
                activity: activity.key.to_string(),
                method: method.to_string(),
                reason: "injected failure".into(),
            });
        }

        self.inventory.breakdown(ctx, activity, method)
    }
}
