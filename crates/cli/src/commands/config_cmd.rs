//! `dopo config`: Configuration management commands.

use super::CmdResult;
use dopo_config::{AppConfig, available_sectors};
use std::path::{Path, PathBuf};

fn resolve(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

pub async fn validate(config_path: Option<&Path>) -> CmdResult {
    let path = resolve(config_path);
    println!("🔍 Validating configuration at {}...", path.display());

    match AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if config.methods.is_empty() {
                warnings.push("No [[methods]] configured; `dopo run` needs at least one".to_string());
            }

            if config.inventory.snapshot.is_none() {
                warnings.push("No inventory snapshot set (inventory.snapshot or DOPO_SNAPSHOT)".to_string());
            }

            match available_sectors(&config.mapping_dir) {
                Ok(known) => {
                    for sector in config.sectors.iter().filter(|s| !known.contains(s)) {
                        warnings.push(format!("Sector '{sector}' has no mapping file"));
                    }
                }
                Err(e) => warnings.push(format!("Mapping directory unusable: {e}")),
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Project:   {}", config.project);
            println!("   Mapping:   {}", config.mapping_dir.display());
            println!("   Sectors:   {}", config.sectors.join(", "));
            println!("   Methods:   {}", config.methods.len());
            println!("   Cutoff:    {}", config.cutoff);
            println!("   Output:    {}", config.report.output.display());
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> CmdResult {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> CmdResult {
    println!("{}", resolve(config_path).display());
    Ok(())
}
