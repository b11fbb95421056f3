//! Subcommand implementations and the pipeline steps they share.

pub mod compare;
pub mod config_cmd;
pub mod match_cmd;
pub mod methods;
pub mod run;

use dopo_config::{AppConfig, load_sector_mappings};
use dopo_core::{EngineContext, LcaEngine};
use dopo_inventory::SnapshotEngine;
use dopo_scores::{
    BatchOutcome, BatchRunner, MethodFinder, ScoreTableBuilder, SectorSets, SelectedMethod,
    collect_sector_sets,
};
use std::path::Path;
use tracing::info;

pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Config from `path` when given, else from the default location.
pub fn load_config(path: Option<&Path>) -> CmdResult<AppConfig> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// The engine named by the configuration.
pub fn open_engine(config: &AppConfig) -> CmdResult<SnapshotEngine> {
    let Some(path) = &config.inventory.snapshot else {
        return Err("No inventory configured: set [inventory] snapshot or DOPO_SNAPSHOT".into());
    };
    let engine = SnapshotEngine::open(path)?;
    info!(engine = engine.name(), path = %path.display(), "Inventory opened");
    Ok(engine)
}

/// Resolve every configured method against the engine's method list.
pub async fn select_methods(
    engine: &dyn LcaEngine,
    ctx: &EngineContext,
    config: &AppConfig,
) -> CmdResult<Vec<SelectedMethod>> {
    if config.methods.is_empty() {
        return Err("No methods configured: add at least one [[methods]] entry".into());
    }
    let mut finder = MethodFinder::from_engine(engine, ctx).await?;
    for m in &config.methods {
        finder.find_and_add(&m.criteria, &m.exclude, m.key.as_deref())?;
    }
    Ok(finder.into_selected())
}

/// Match sectors in `databases`, then build and aggregate every unit.
pub async fn score(
    engine: &dyn LcaEngine,
    ctx: &EngineContext,
    config: &AppConfig,
    databases: &[String],
    methods: &[SelectedMethod],
) -> CmdResult<(SectorSets, BatchOutcome)> {
    let mappings = load_sector_mappings(&config.mapping_dir, &config.sectors, &config.selector)?;
    let sets = collect_sector_sets(engine, ctx, databases, &mappings).await?;

    let builder = ScoreTableBuilder::new(engine, ctx.clone()).with_tolerance(config.tolerance);
    let outcome = BatchRunner::new(builder, config.cutoff)
        .with_concurrency(config.concurrency)
        .run(&sets.by_sector(), methods)
        .await;

    info!(
        units = outcome.units,
        succeeded = outcome.succeeded(),
        failed = outcome.failures.len(),
        "Scoring finished"
    );
    Ok((sets, outcome))
}

/// Print failures and skips; returns how many problems there were.
pub fn report_problems(sets: &SectorSets, outcome: &BatchOutcome) -> usize {
    for (sector, error) in &sets.failed {
        println!("   ❌ {sector}: {error}");
    }
    for sector in &outcome.skipped {
        println!("   ⚠️  {sector}: no activities matched");
    }
    for failure in &outcome.failures {
        println!("   ❌ {failure}");
    }
    sets.failed.len() + outcome.failures.len()
}
