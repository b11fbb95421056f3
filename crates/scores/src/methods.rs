//! Method selection by substring criteria.

use crate::ScoreError;
use dopo_core::{EngineContext, LcaEngine, MethodDescriptor, MethodInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A method chosen for scoring, stored under its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedMethod {
    pub key: String,
    pub descriptor: MethodDescriptor,
    pub unit: String,
}

/// Finds methods among the engine's available ones and keeps the selection.
#[derive(Debug, Clone, Default)]
pub struct MethodFinder {
    available: Vec<MethodInfo>,
    selected: Vec<SelectedMethod>,
    counter: usize,
}

impl MethodFinder {
    pub fn new(available: Vec<MethodInfo>) -> Self {
        Self {
            available,
            selected: Vec::new(),
            counter: 0,
        }
    }

    /// Start from the methods of the context's project.
    pub async fn from_engine(
        engine: &dyn LcaEngine,
        ctx: &EngineContext,
    ) -> Result<Self, ScoreError> {
        let available = engine.list_methods(ctx).await?;
        debug!(project = %ctx.project, methods = available.len(), "Methods listed");
        Ok(Self::new(available))
    }

    pub fn available(&self) -> &[MethodInfo] {
        &self.available
    }

    /// The one method whose display string contains every criterion and
    /// none of the exclusions.
    pub fn find(&self, criteria: &[String], exclude: &[String]) -> Result<&MethodInfo, ScoreError> {
        let matches: Vec<&MethodInfo> = self
            .available
            .iter()
            .filter(|m| {
                let text = m.descriptor.to_string();
                criteria.iter().all(|c| text.contains(c.as_str()))
                    && !exclude.iter().any(|x| text.contains(x.as_str()))
            })
            .collect();

        match matches.as_slice() {
            [] => Err(ScoreError::NoMethodFound {
                criteria: criteria.to_vec(),
                exclude: exclude.to_vec(),
            }),
            [one] => Ok(one),
            many => Err(ScoreError::AmbiguousMethod {
                criteria: criteria.to_vec(),
                candidates: many.iter().map(|m| m.descriptor.to_string()).collect(),
            }),
        }
    }

    /// Find a method and add it to the selection under `key`, or under
    /// `method_<n>` when no key is given.
    pub fn find_and_add(
        &mut self,
        criteria: &[String],
        exclude: &[String],
        key: Option<&str>,
    ) -> Result<&SelectedMethod, ScoreError> {
        let info = self.find(criteria, exclude)?.clone();

        let key = match key {
            Some(k) => k.to_string(),
            None => {
                self.counter += 1;
                format!("method_{}", self.counter)
            }
        };
        if self.selected.iter().any(|m| m.key == key) {
            return Err(ScoreError::DuplicateMethodKey(key));
        }

        debug!(key = %key, method = %info.descriptor, "Method selected");
        self.selected.push(SelectedMethod {
            key,
            descriptor: info.descriptor,
            unit: info.unit,
        });
        let last = self.selected.len() - 1;
        Ok(&self.selected[last])
    }

    /// Case-insensitive search over the available methods.
    pub fn search(&self, text: &str) -> Vec<&MethodInfo> {
        let needle = text.to_lowercase();
        self.available
            .iter()
            .filter(|m| m.descriptor.to_string().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn selected(&self) -> &[SelectedMethod] {
        &self.selected
    }

    pub fn into_selected(self) -> Vec<SelectedMethod> {
        self.selected
    }
}
