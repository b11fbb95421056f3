//! LCA engine trait: the abstraction over the external LCA calculator.
//!
//! The engine owns projects, databases, impact methods and the actual
//! life-cycle computation. dopo only asks it for activity lists and for
//! per-activity contribution breakdowns.
//!
//! There is no ambient "current project". Every call receives an explicit
//! [`EngineContext`], so concurrent calls never race on selection state.
//!
//! Implementations: in-memory (for testing), JSON inventory snapshot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::activity::Activity;
use crate::error::EngineError;
use crate::method::{MethodDescriptor, MethodInfo};

/// Project and (optionally) database selection for one engine call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineContext {
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl EngineContext {
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            database: None,
        }
    }

    /// A copy of this context pointing at `database`.
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self {
            project: self.project.clone(),
            database: Some(database.into()),
        }
    }

    /// The selected database, or `NoDatabase` if none was chosen.
    pub fn require_database(&self) -> Result<&str, EngineError> {
        self.database
            .as_deref()
            .ok_or_else(|| EngineError::NoDatabase(self.project.clone()))
    }
}

/// Score of one activity under one method, split by contribution category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub total: f64,
    #[serde(default)]
    pub categories: BTreeMap<String, f64>,
}

impl Breakdown {
    pub fn new(total: f64) -> Self {
        Self {
            total,
            categories: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>, value: f64) -> Self {
        *self.categories.entry(category.into()).or_insert(0.0) += value;
        self
    }

    /// Sum of all category values.
    pub fn category_sum(&self) -> f64 {
        self.categories.values().sum()
    }
}

/// The core LcaEngine trait.
#[async_trait]
pub trait LcaEngine: Send + Sync {
    /// The engine name (e.g., "in_memory", "snapshot").
    fn name(&self) -> &str;

    /// Projects known to the engine.
    async fn list_projects(&self) -> Result<Vec<String>, EngineError>;

    /// Validate a project and return a context for it.
    ///
    /// Replaces the engine-global "set current project" call.
    async fn open_project(&self, project: &str) -> Result<EngineContext, EngineError> {
        if self.list_projects().await?.iter().any(|p| p == project) {
            Ok(EngineContext::for_project(project))
        } else {
            Err(EngineError::UnknownProject(project.to_string()))
        }
    }

    /// Databases inside the context's project.
    async fn list_databases(&self, ctx: &EngineContext) -> Result<Vec<String>, EngineError>;

    /// All activities of the context's database.
    async fn activities(&self, ctx: &EngineContext) -> Result<Vec<Activity>, EngineError>;

    /// Impact methods available in the context's project.
    async fn list_methods(&self, ctx: &EngineContext) -> Result<Vec<MethodInfo>, EngineError>;

    /// Compute the contribution breakdown of one activity under one method.
    async fn compute_breakdown(
        &self,
        ctx: &EngineContext,
        activity: &Activity,
        method: &MethodDescriptor,
    ) -> Result<Breakdown, EngineError>;

    /// Classification code of an activity under a scheme (e.g. "CPC").
    async fn classification(
        &self,
        ctx: &EngineContext,
        activity: &Activity,
        scheme: &str,
    ) -> Result<Option<String>, EngineError> {
        let _ = ctx;
        Ok(activity.classification(scheme).map(String::from))
    }
}
