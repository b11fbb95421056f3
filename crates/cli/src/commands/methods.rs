//! `dopo methods`: list impact assessment methods.

use super::{CmdResult, load_config, open_engine};
use dopo_core::LcaEngine;
use dopo_scores::MethodFinder;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, search: Option<String>) -> CmdResult {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;
    let ctx = engine.open_project(&config.project).await?;
    let finder = MethodFinder::from_engine(&engine, &ctx).await?;

    let methods = match &search {
        Some(text) => finder.search(text),
        None => finder.available().iter().collect(),
    };

    if methods.is_empty() {
        println!("   No methods found.");
        return Ok(());
    }
    for (i, m) in methods.iter().enumerate() {
        println!("  {:>3}. {}  [{}]", i + 1, m.descriptor, m.unit);
    }
    println!();
    println!("  {} of {} method(s)", methods.len(), finder.available().len());
    Ok(())
}
