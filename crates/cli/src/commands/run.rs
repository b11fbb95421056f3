//! `dopo run`: match, score, aggregate, then write the report.

use super::{CmdResult, load_config, open_engine, report_problems, score, select_methods};
use dopo_core::LcaEngine;
use dopo_report::{AssemblyOptions, ReportAssembler, WorkbookMetadata, exporter_for};
use std::path::{Path, PathBuf};

pub async fn run(
    config_path: Option<&Path>,
    cutoff: Option<f64>,
    output: Option<PathBuf>,
) -> CmdResult {
    let mut config = load_config(config_path)?;
    if let Some(c) = cutoff {
        config.cutoff = c;
    }
    if let Some(o) = output {
        config.report.output = o;
    }
    config.validate()?;

    let engine = open_engine(&config)?;
    let ctx = engine.open_project(&config.project).await?;
    let methods = select_methods(&engine, &ctx, &config).await?;

    println!("📊 Scoring {} sector(s) with {} method(s)...", config.sectors.len(), methods.len());
    let (sets, outcome) = score(&engine, &ctx, &config, &config.databases, &methods).await?;

    let options = AssemblyOptions {
        combined_sheets: config.report.combined_sheets,
        statistics: config.report.statistics,
        charts: config.report.charts,
    };
    let metadata = WorkbookMetadata::new(&config.project)
        .with_databases(config.databases.clone())
        .with_cutoff(config.cutoff);
    let workbook = ReportAssembler::new(options).assemble(&outcome.tables, metadata);

    let problems = report_problems(&sets, &outcome);
    if !workbook.is_empty() {
        exporter_for(&config.report.output).export(&workbook, &config.report.output)?;
        println!(
            "   ✅ {} of {} unit(s) written to {} ({} sheets)",
            outcome.succeeded(),
            outcome.units,
            config.report.output.display(),
            workbook.sheets.len()
        );
    }

    if problems > 0 {
        return Err(format!("{problems} sector/method unit(s) failed").into());
    }
    if workbook.is_empty() {
        return Err("Nothing to report: no sector matched any activity".into());
    }
    Ok(())
}
