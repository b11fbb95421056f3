//! Sector mapping files.
//!
//! A mapping file is a YAML document whose top level maps technology names
//! to mappings. Each technology may carry several alias blocks; the loader
//! keeps only the one named by the selector (e.g. `ecoinvent_aliases`):
//!
//! ```yaml
//! steel, electric arc furnace:
//!   ecoinvent_aliases:
//!     fltr: steel production, electric
//!     mask: {location: RoW}
//!   iam_aliases:
//!     image: Steel - EAF
//! ```
//!
//! Sectors group technologies: `<mapping_dir>/<sector>.yaml`.

use crate::ConfigError;
use dopo_filters::FilterSpec;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse a mapping document and extract each entry's `selector` block.
///
/// `origin` names the document in error messages. Entries without the
/// selector key are omitted.
pub fn load_mapping(
    source: &str,
    selector: &str,
    origin: &str,
) -> Result<BTreeMap<String, FilterSpec>, ConfigError> {
    let format_error = |reason: String| ConfigError::FormatError {
        origin: origin.to_string(),
        reason,
    };

    let doc: Value = serde_yaml::from_str(source).map_err(|e| format_error(e.to_string()))?;
    let top = match doc {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(m) => m,
        other => {
            return Err(format_error(format!(
                "top level must be a mapping, found {}",
                kind(&other)
            )));
        }
    };

    let mut mapping = BTreeMap::new();
    for (key, value) in top {
        let Value::String(name) = key else {
            return Err(format_error(format!(
                "top-level keys must be strings, found {}",
                kind(&key)
            )));
        };
        let Value::Mapping(entry) = value else {
            return Err(format_error(format!(
                "entry '{name}' must be a mapping, found {}",
                kind(&value)
            )));
        };
        let Some(block) = entry.get(selector) else {
            continue;
        };
        let spec: FilterSpec = serde_yaml::from_value(block.clone())
            .map_err(|e| format_error(format!("entry '{name}': {e}")))?;
        mapping.insert(name, spec);
    }

    debug!(origin, selector, entries = mapping.len(), "Mapping loaded");
    Ok(mapping)
}

/// Read and parse a mapping file.
pub fn load_mapping_file(
    path: &Path,
    selector: &str,
) -> Result<BTreeMap<String, FilterSpec>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    load_mapping(&content, selector, &path.display().to_string())
}

/// Sector names available in a mapping directory (file stems of `*.yaml`/`*.yml`).
pub fn available_sectors(dir: &Path) -> Result<Vec<String>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::ReadError {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut sectors: Vec<String> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml")
        })
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();
    sectors.sort();
    sectors.dedup();
    Ok(sectors)
}

/// Path of a sector's mapping file, preferring `.yaml` over `.yml`.
pub fn sector_file(dir: &Path, sector: &str) -> Option<PathBuf> {
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{sector}.{ext}")))
        .find(|p| p.is_file())
}

/// Load the mapping of every requested sector.
///
/// Returns `sector → (technology → FilterSpec)`. An unknown sector is a
/// validation error listing the sectors that do exist.
pub fn load_sector_mappings(
    dir: &Path,
    sectors: &[String],
    selector: &str,
) -> Result<BTreeMap<String, BTreeMap<String, FilterSpec>>, ConfigError> {
    let mut out = BTreeMap::new();
    for sector in sectors {
        let Some(path) = sector_file(dir, sector) else {
            let known = available_sectors(dir).unwrap_or_default();
            return Err(ConfigError::ValidationError(format!(
                "invalid sector name '{sector}'; valid sectors are: {}",
                known.join(", ")
            )));
        };
        out.insert(sector.clone(), load_mapping_file(&path, selector)?);
    }
    Ok(out)
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dopo_filters::PredicateSpec;

    const CEMENT: &str = r#"
cement, dry feed rotary kiln:
  ecoinvent_aliases:
    fltr:
      name: [cement production, clinker production]
    mask: market for
  iam_aliases:
    image: Cement - Dry feed rotary kiln

cement, semi-dry feed rotary kiln:
  iam_aliases:
    image: Cement - Semi-dry

cement, CCS:
  ecoinvent_aliases:
    fltr: cement production, with CCS
"#;

    #[test]
    fn selector_blocks_are_extracted() {
        let m = load_mapping(CEMENT, "ecoinvent_aliases", "cement.yaml").unwrap();
        assert_eq!(m.len(), 2);
        let dry = &m["cement, dry feed rotary kiln"];
        assert!(matches!(dry.fltr, Some(PredicateSpec::Fields(_))));
        assert_eq!(dry.mask, Some(PredicateSpec::Text("market for".into())));
        assert_eq!(
            m["cement, CCS"].fltr,
            Some(PredicateSpec::Text("cement production, with CCS".into()))
        );
    }

    #[test]
    fn entries_without_selector_are_omitted() {
        let m = load_mapping(CEMENT, "premise_aliases", "cement.yaml").unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn unparsable_document_is_format_error() {
        let err = load_mapping("a: [unclosed", "ecoinvent_aliases", "bad.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FormatError { origin, .. } if origin == "bad.yaml"));
    }

    #[test]
    fn wrong_shape_is_format_error() {
        assert!(matches!(
            load_mapping("- a\n- b\n", "ecoinvent_aliases", "list.yaml"),
            Err(ConfigError::FormatError { .. })
        ));
        assert!(matches!(
            load_mapping("steel: just a string\n", "ecoinvent_aliases", "flat.yaml"),
            Err(ConfigError::FormatError { .. })
        ));
    }

    #[test]
    fn invalid_filter_block_is_format_error() {
        let doc = "steel:\n  ecoinvent_aliases:\n    fltr: {name: {nested: 1}}\n";
        assert!(matches!(
            load_mapping(doc, "ecoinvent_aliases", "steel.yaml"),
            Err(ConfigError::FormatError { .. })
        ));
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        assert!(load_mapping("", "ecoinvent_aliases", "empty.yaml").unwrap().is_empty());
    }

    #[test]
    fn sector_files_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cement.yaml"), CEMENT).unwrap();
        std::fs::write(
            dir.path().join("steel.yml"),
            "steel:\n  ecoinvent_aliases:\n    fltr: steel production\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(available_sectors(dir.path()).unwrap(), ["cement", "steel"]);

        let all = load_sector_mappings(
            dir.path(),
            &["cement".into(), "steel".into()],
            "ecoinvent_aliases",
        )
        .unwrap();
        assert_eq!(all["cement"].len(), 2);
        assert_eq!(all["steel"].len(), 1);

        let err = load_sector_mappings(dir.path(), &["glass".into()], "ecoinvent_aliases")
            .unwrap_err();
        assert!(err.to_string().contains("cement, steel"));
    }
}
