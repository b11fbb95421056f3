//! `dopo match`: show what a sector's filters select.

use super::{CmdResult, load_config, open_engine};
use dopo_config::load_sector_mappings;
use dopo_core::LcaEngine;
use dopo_scores::collect_sector_sets;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, sector: &str, database: Option<String>) -> CmdResult {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;
    let ctx = engine.open_project(&config.project).await?;

    let mappings =
        load_sector_mappings(&config.mapping_dir, &[sector.to_string()], &config.selector)?;
    let databases = database.map(|d| vec![d]).unwrap_or_else(|| config.databases.clone());
    let sets = collect_sector_sets(&engine, &ctx, &databases, &mappings).await?;

    if let Some(error) = sets.failed.get(sector) {
        return Err(format!("{sector}: {error}").into());
    }

    println!("🔍 Sector '{sector}'");
    for (technology, set) in sets.technologies.get(sector).into_iter().flatten() {
        println!();
        println!("  {technology} ({} activities)", set.len());
        for activity in set {
            println!("    - {} [{}]", activity.label(), activity.key);
        }
    }
    println!();
    println!("  Total: {} activities", sets.sector(sector).len());
    Ok(())
}
