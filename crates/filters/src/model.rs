//! Filter data model: the types that define activity selections.

use dopo_core::{Activity, FilterError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field's values: a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValues {
    One(String),
    Many(Vec<String>),
}

impl FieldValues {
    fn into_vec(self) -> Vec<String> {
        match self {
            FieldValues::One(v) => vec![v],
            FieldValues::Many(vs) => vs,
        }
    }
}

/// A predicate as written in a mapping file.
///
/// A bare string or list is shorthand for `{name: <value>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateSpec {
    Text(String),
    List(Vec<String>),
    Fields(BTreeMap<String, FieldValues>),
}

impl PredicateSpec {
    /// Normalize into per-field predicates.
    pub fn normalize(&self) -> Predicate {
        let fields = match self.clone() {
            PredicateSpec::Text(v) => vec![FieldPredicate::new("name", vec![v])],
            PredicateSpec::List(vs) => vec![FieldPredicate::new("name", vs)],
            PredicateSpec::Fields(map) => map
                .into_iter()
                .map(|(field, values)| FieldPredicate::new(field, values.into_vec()))
                .collect(),
        };
        Predicate { fields }
    }
}

impl From<&str> for PredicateSpec {
    fn from(s: &str) -> Self {
        PredicateSpec::Text(s.to_string())
    }
}

/// Values for one field, OR-combined by substring containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPredicate {
    pub field: String,
    pub values: Vec<String>,
}

impl FieldPredicate {
    pub fn new(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }

    /// Does any value occur inside the activity's field?
    pub fn matches(&self, activity: &Activity) -> Result<bool, FilterError> {
        let text = activity
            .field(&self.field)
            .ok_or_else(|| FilterError::FieldAccess {
                field: self.field.clone(),
                activity: activity.key.to_string(),
            })?;
        Ok(self.values.iter().any(|v| text.contains(v.as_str())))
    }
}

/// A normalized predicate: field predicates ANDed together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Predicate {
    pub fields: Vec<FieldPredicate>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject predicates that could never be evaluated meaningfully as `fltr`.
    pub fn validate_inclusion(&self, name: &str) -> Result<(), FilterError> {
        if self.fields.is_empty() {
            return Err(FilterError::InvalidFilter {
                name: name.into(),
                reason: "fltr must not be empty".into(),
            });
        }
        for fp in &self.fields {
            if fp.field.trim().is_empty() {
                return Err(FilterError::InvalidFilter {
                    name: name.into(),
                    reason: "fltr field name cannot be empty".into(),
                });
            }
            if fp.values.is_empty() {
                return Err(FilterError::InvalidFilter {
                    name: name.into(),
                    reason: format!("fltr field '{}' has no values", fp.field),
                });
            }
            // an empty value matches every activity
            if fp.values.iter().any(|v| v.trim().is_empty()) {
                return Err(FilterError::InvalidFilter {
                    name: name.into(),
                    reason: format!("fltr field '{}' has an empty value", fp.field),
                });
            }
        }
        Ok(())
    }
}

/// A named technology's selection: include by `fltr`, then subtract `mask`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fltr: Option<PredicateSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<PredicateSpec>,
}

impl FilterSpec {
    pub fn new(fltr: PredicateSpec) -> Self {
        Self {
            fltr: Some(fltr),
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: PredicateSpec) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Validate and normalize. `name` is used in error messages.
    pub fn compile(&self, name: &str) -> Result<CompiledFilter, FilterError> {
        let include = self
            .fltr
            .as_ref()
            .map(PredicateSpec::normalize)
            .unwrap_or_default();
        include.validate_inclusion(name)?;

        let exclude = self
            .mask
            .as_ref()
            .map(PredicateSpec::normalize)
            .unwrap_or_default();

        Ok(CompiledFilter {
            name: name.to_string(),
            include,
            exclude,
        })
    }
}

/// A validated filter ready for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFilter {
    pub name: String,
    pub include: Predicate,
    pub exclude: Predicate,
}
