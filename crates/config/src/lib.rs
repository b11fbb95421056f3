//! Configuration loading, validation, and management for dopo.
//!
//! Loads configuration from `~/.dopo/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Sector mapping files (YAML) are loaded by the [`mapping`] module.

pub mod mapping;

pub use mapping::{
    available_sectors, load_mapping, load_mapping_file, load_sector_mappings, sector_file,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sectors analysed when the configuration names none.
pub const DEFAULT_SECTORS: [&str; 6] = [
    "cement",
    "steel",
    "iron",
    "fuel",
    "electricity",
    "transport",
];

/// The root configuration structure.
///
/// Maps directly to `~/.dopo/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LCA project to open
    #[serde(default = "default_project")]
    pub project: String,

    /// Databases to analyse; empty means every database of the project
    #[serde(default)]
    pub databases: Vec<String>,

    /// Directory holding `<sector>.yaml` mapping files
    #[serde(default = "default_mapping_dir")]
    pub mapping_dir: PathBuf,

    /// Sectors to analyse
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,

    /// Alias block read from each mapping entry
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Share of a row's total below which a category is folded into `other`
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,

    /// Maximum number of (sector, method) units computed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Relative tolerance when checking that categories sum to the total
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Impact assessment methods to score with
    #[serde(default)]
    pub methods: Vec<MethodConfig>,

    #[serde(default)]
    pub report: ReportConfig,
}

fn default_project() -> String {
    "default".into()
}
fn default_mapping_dir() -> PathBuf {
    PathBuf::from("mapping")
}
fn default_sectors() -> Vec<String> {
    DEFAULT_SECTORS.iter().map(|s| s.to_string()).collect()
}
fn default_selector() -> String {
    "ecoinvent_aliases".into()
}
fn default_cutoff() -> f64 {
    0.01
}
fn default_concurrency() -> usize {
    1
}
fn default_tolerance() -> f64 {
    1e-6
}
fn default_true() -> bool {
    true
}

/// Where the inventory comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// JSON snapshot of projects, databases, methods and breakdowns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
}

/// A method selection: substring criteria over the method's display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodConfig {
    pub criteria: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Custom key; `method_<n>` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Write one concatenated sheet per sector before the method sheets
    #[serde(default = "default_true")]
    pub combined_sheets: bool,

    /// Add rank/mean/std/quartile columns
    #[serde(default = "default_true")]
    pub statistics: bool,

    #[serde(default = "default_true")]
    pub charts: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("dopo_report.json")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            combined_sheets: true,
            statistics: true,
            charts: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.dopo/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `DOPO_PROJECT`
    /// - `DOPO_CUTOFF`
    /// - `DOPO_SNAPSHOT`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `DOPO_*` overrides read through `lookup`, then re-validate.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(project) = lookup("DOPO_PROJECT") {
            self.project = project;
        }

        if let Some(raw) = lookup("DOPO_CUTOFF") {
            self.cutoff = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("DOPO_CUTOFF is not a number: '{raw}'"))
            })?;
        }

        if let Some(snapshot) = lookup("DOPO_SNAPSHOT") {
            self.inventory.snapshot = Some(PathBuf::from(snapshot));
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".dopo")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.cutoff) {
            return Err(ConfigError::ValidationError(format!(
                "cutoff must be in [0, 1), got {}",
                self.cutoff
            )));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "concurrency must be >= 1".into(),
            ));
        }

        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(ConfigError::ValidationError(
                "tolerance must be a non-negative number".into(),
            ));
        }

        if self.selector.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "selector cannot be empty".into(),
            ));
        }

        for (i, method) in self.methods.iter().enumerate() {
            if method.criteria.is_empty() || method.criteria.iter().any(|c| c.is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "methods[{i}] needs at least one non-empty criterion"
                )));
            }
            if method.key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "methods[{i}].key cannot be empty"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            databases: vec![],
            mapping_dir: default_mapping_dir(),
            sectors: default_sectors(),
            selector: default_selector(),
            cutoff: default_cutoff(),
            concurrency: default_concurrency(),
            tolerance: default_tolerance(),
            inventory: InventoryConfig::default(),
            methods: vec![],
            report: ReportConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Malformed mapping in {origin}: {reason}")]
    FormatError { origin: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cutoff, 0.01);
        assert_eq!(config.selector, "ecoinvent_aliases");
        assert_eq!(config.sectors.len(), 6);
        assert!(config.report.combined_sheets);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.project, config.project);
        assert_eq!(parsed.sectors, config.sectors);
        assert_eq!(parsed.report.output, config.report.output);
    }

    #[test]
    fn full_config_parsing() {
        let toml_str = r#"
project = "ecoinvent-3.9"
databases = ["ecoinvent-3.9.1-cutoff"]
mapping_dir = "maps"
sectors = ["cement", "steel"]
cutoff = 0.05
concurrency = 4

[inventory]
snapshot = "inventory.json"

[[methods]]
criteria = ["IPCC 2021", "GWP100"]
exclude = ["LT"]
key = "gwp"

[[methods]]
criteria = ["water use"]

[report]
output = "out.json"
charts = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.project, "ecoinvent-3.9");
        assert_eq!(config.mapping_dir, PathBuf::from("maps"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.inventory.snapshot, Some(PathBuf::from("inventory.json")));
        assert_eq!(config.methods.len(), 2);
        assert_eq!(config.methods[0].key.as_deref(), Some("gwp"));
        assert!(config.methods[1].exclude.is_empty());
        assert!(!config.report.charts);
        assert!(config.report.statistics);
        assert_eq!(config.selector, "ecoinvent_aliases");
    }

    #[test]
    fn invalid_cutoff_rejected() {
        for cutoff in [-0.1, 1.0, 2.5, f64::NAN] {
            let config = AppConfig {
                cutoff,
                ..AppConfig::default()
            };
            assert!(config.validate().is_err(), "cutoff {cutoff} accepted");
        }
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = AppConfig {
            concurrency: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_method_criteria_rejected() {
        let config = AppConfig {
            methods: vec![MethodConfig {
                criteria: vec![],
                exclude: vec![],
                key: None,
            }],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.project, "default");
    }

    #[test]
    fn invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cutoff = [not toml").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));

        std::fs::write(&path, "cutoff = 3.0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("DOPO_PROJECT", "premise"),
            ("DOPO_CUTOFF", "0.2"),
            ("DOPO_SNAPSHOT", "/data/snap.json"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.project, "premise");
        assert_eq!(config.cutoff, 0.2);
        assert_eq!(config.inventory.snapshot, Some(PathBuf::from("/data/snap.json")));
    }

    #[test]
    fn bad_env_cutoff_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "DOPO_CUTOFF").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DOPO_CUTOFF"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("ecoinvent_aliases"));
        assert!(toml_str.contains("dopo_report.json"));
    }
}
