//! `dopo compare`: relative score changes between two databases.

use super::{CmdResult, load_config, open_engine, report_problems, score, select_methods};
use dopo_core::LcaEngine;
use dopo_report::{WorkbookMetadata, comparison_workbook, exporter_for};
use dopo_scores::compare_all;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT: &str = "dopo_comparison.json";

pub async fn run(
    config_path: Option<&Path>,
    base_db: &str,
    other_db: &str,
    output: Option<PathBuf>,
) -> CmdResult {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;
    let ctx = engine.open_project(&config.project).await?;
    let methods = select_methods(&engine, &ctx, &config).await?;

    println!("⚖️  Comparing {base_db} → {other_db}");
    let (base_sets, base) = score(&engine, &ctx, &config, &[base_db.to_string()], &methods).await?;
    let (other_sets, other) =
        score(&engine, &ctx, &config, &[other_db.to_string()], &methods).await?;
    let problems = report_problems(&base_sets, &base) + report_problems(&other_sets, &other);

    let comparisons = compare_all(&base.tables, &other.tables)?;
    for cmp in &comparisons {
        println!();
        println!("  {} / {} ({})", cmp.sector, cmp.method_key, cmp.method_unit);
        for change in cmp.changes.iter().take(5) {
            println!(
                "    {:>3}. {:+.2}%  {} [{}]",
                change.rank, change.relative_change, change.activity, change.location
            );
        }
        if !cmp.unmatched.is_empty() {
            println!("    ({} unmatched)", cmp.unmatched.len());
        }
    }

    let metadata = WorkbookMetadata::new(&config.project)
        .with_databases(vec![base_db.to_string(), other_db.to_string()]);
    let workbook = comparison_workbook(&comparisons, metadata);
    if !workbook.is_empty() {
        let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        exporter_for(&output).export(&workbook, &output)?;
        println!();
        println!("   ✅ {} comparison(s) written to {}", comparisons.len(), output.display());
    }

    if problems > 0 {
        return Err(format!("{problems} sector/method unit(s) failed").into());
    }
    Ok(())
}
