//! Activity records: unit processes read from an LCA database.
//!
//! Activities are owned by the external LCA database. The core never
//! mutates them; it only reads named fields for filtering and identity
//! columns for score tables.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Composite identity of an activity: `(database, code)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityKey {
    pub database: String,
    pub code: String,
}

impl ActivityKey {
    pub fn new(database: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', '{}')", self.database, self.code)
    }
}

/// A classification code attached to an activity (e.g. CPC, ISIC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub scheme: String,
    pub code: String,
}

/// A unit process record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub key: ActivityKey,

    pub name: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub unit: String,

    #[serde(
        default,
        rename = "reference product",
        alias = "reference_product",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_product: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<Classification>,

    /// Any other textual fields exported by the database.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Activity {
    pub fn new(key: ActivityKey, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            location: location.into(),
            unit: String::new(),
            reference_product: None,
            classifications: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_reference_product(mut self, product: impl Into<String>) -> Self {
        self.reference_product = Some(product.into());
        self
    }

    pub fn with_classification(mut self, scheme: impl Into<String>, code: impl Into<String>) -> Self {
        self.classifications.push(Classification {
            scheme: scheme.into(),
            code: code.into(),
        });
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(field.into(), value.into());
        self
    }

    /// Look up a named field.
    ///
    /// Resolution order: the fixed fields, then `extra`, then a
    /// classification whose scheme matches case-insensitively.
    /// Returns `None` when the activity has no such field.
    pub fn field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "location" => Some(&self.location),
            "unit" => Some(&self.unit),
            "reference product" | "reference_product" => self.reference_product.as_deref(),
            "database" => Some(&self.key.database),
            "code" => Some(&self.key.code),
            other => self.extra.get(other).map(String::as_str).or_else(|| {
                self.classifications
                    .iter()
                    .find(|c| c.scheme.eq_ignore_ascii_case(other))
                    .map(|c| c.code.as_str())
            }),
        }
    }

    /// Classification code for a scheme, if present.
    pub fn classification(&self, scheme: &str) -> Option<&str> {
        self.classifications
            .iter()
            .find(|c| c.scheme.eq_ignore_ascii_case(scheme))
            .map(|c| c.code.as_str())
    }

    /// `name/location` label used in logs and error messages.
    pub fn label(&self) -> String {
        format!("{}/{}", self.name, self.location)
    }
}

/// Activities compare by key only.
impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Activity {}

impl std::hash::Hash for Activity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// An immutable set of activities matching one filter specification.
///
/// Membership is keyed by [`ActivityKey`]; iteration order is by key so
/// repeated runs produce identical tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitySet {
    members: BTreeMap<ActivityKey, Activity>,
}

impl ActivitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, key: &ActivityKey) -> bool {
        self.members.contains_key(key)
    }

    pub fn get(&self, key: &ActivityKey) -> Option<&Activity> {
        self.members.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.members.values()
    }

    pub fn keys(&self) -> BTreeSet<ActivityKey> {
        self.members.keys().cloned().collect()
    }

    /// Union of two sets. Neither input is modified.
    pub fn union(&self, other: &ActivitySet) -> ActivitySet {
        let mut members = self.members.clone();
        for (key, activity) in &other.members {
            members.entry(key.clone()).or_insert_with(|| activity.clone());
        }
        ActivitySet { members }
    }

    /// Members of `self` that are not in `other`.
    pub fn difference(&self, other: &ActivitySet) -> ActivitySet {
        ActivitySet {
            members: self
                .members
                .iter()
                .filter(|(key, _)| !other.members.contains_key(*key))
                .map(|(k, a)| (k.clone(), a.clone()))
                .collect(),
        }
    }
}

impl FromIterator<Activity> for ActivitySet {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().map(|a| (a.key.clone(), a)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ActivitySet {
    type Item = &'a Activity;
    type IntoIter = std::collections::btree_map::Values<'a, ActivityKey, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.values()
    }
}
