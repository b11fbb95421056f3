//! End-to-end integration tests for the dopo pipeline.
//!
//! These tests drive every library crate together: mapping files on disk,
//! activity matching, method selection, batch scoring with aggregation,
//! report assembly and export.

use std::collections::BTreeMap;
use std::path::Path;

use dopo_config::{AppConfig, ConfigError, load_sector_mappings};
use dopo_core::{
    Activity, ActivityKey, Breakdown, EngineContext, LcaEngine, MethodDescriptor, TOTAL_COLUMN,
};
use dopo_inventory::{InMemoryEngine, SnapshotEngine};
use dopo_report::{
    AssemblyOptions, Cell, ChartKind, Exporter, JsonWorkbookExporter, ReportAssembler, Workbook,
    WorkbookMetadata, comparison_workbook,
};
use dopo_scores::{
    BatchOutcome, BatchRunner, MethodFinder, ScoreError, ScoreTableBuilder, SectorSets,
    SelectedMethod, collect_sector_sets, compare_all,
};

// ── Fixture ──────────────────────────────────────────────────────────────

const PROJECT: &str = "dopo";

const CEMENT_YAML: &str = r#"
cement, Portland:
  ecoinvent_aliases:
    fltr: cement production, Portland
    mask:
      location: RoW
  iam_aliases:
    image: Cement
clinker:
  ecoinvent_aliases:
    fltr: clinker production
"#;

const STEEL_YAML: &str = r#"
steel, electric:
  ecoinvent_aliases:
    fltr:
      name: steel production, electric
      location: [DE, CH]
"#;

fn gwp100() -> MethodDescriptor {
    MethodDescriptor::new("IPCC 2021", "climate change", "GWP100")
}

fn gwp20() -> MethodDescriptor {
    MethodDescriptor::new("IPCC 2021", "climate change", "GWP20")
}

fn land_use() -> MethodDescriptor {
    MethodDescriptor::new("ReCiPe 2016", "land use", "LOP")
}

fn activity(db: &str, code: &str, name: &str, location: &str) -> Activity {
    Activity::new(ActivityKey::new(db, code), name, location)
        .with_unit("kilogram")
        .with_reference_product(name.split(',').next().unwrap_or(name).trim())
}

fn breakdown(scale: f64, parts: &[(&str, f64)]) -> Breakdown {
    let total: f64 = parts.iter().map(|(_, v)| v * scale).sum();
    parts
        .iter()
        .fold(Breakdown::new(total), |b, (c, v)| b.with_category(*c, v * scale))
}

/// Base contributions per activity code (GWP100 scale in `ei`).
fn parts(code: &str) -> Vec<(&'static str, f64)> {
    match code {
        "c1" | "c2" => vec![("23: clinker", 80.0), ("17: electricity", 19.5), ("4: transport", 0.5)],
        "k1" => vec![("23: clinker", 84.0), ("4: transport", 1.0)],
        _ => vec![("17: electricity", 150.0), ("Unnamed: 3", 30.0), ("4: transport", 20.0)],
    }
}

/// Two databases (`ei`, `premise`) with the same activity codes; premise
/// halves cement scores and doubles steel scores.
fn engine() -> InMemoryEngine {
    let mut engine = InMemoryEngine::new()
        .with_method(PROJECT, gwp100(), "kg CO2-Eq")
        .with_method(PROJECT, gwp20(), "kg CO2-Eq")
        .with_method(PROJECT, land_use(), "m2*a crop-Eq");

    for db in ["ei", "premise"] {
        let activities = [
            activity(db, "c1", "cement production, Portland", "CH"),
            activity(db, "c2", "cement production, Portland", "RoW"),
            activity(db, "k1", "clinker production", "CH"),
            activity(db, "s1", "steel production, electric, low-alloyed", "DE"),
            activity(db, "s2", "steel production, electric, low-alloyed", "US"),
        ];
        for a in activities {
            let premise_scale = match (db, a.key.code.starts_with('s')) {
                ("ei", _) => 1.0,
                (_, true) => 2.0,
                (_, false) => 0.5,
            };
            let p = parts(&a.key.code);
            let key = a.key.clone();
            engine = engine
                .with_activity(PROJECT, a)
                .with_breakdown(PROJECT, &key, &gwp100(), breakdown(premise_scale, &p))
                .with_breakdown(PROJECT, &key, &gwp20(), breakdown(premise_scale * 1.25, &p))
                .with_breakdown(PROJECT, &key, &land_use(), breakdown(premise_scale * 0.01, &p));
        }
    }
    engine
}

fn mapping_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cement.yaml"), CEMENT_YAML).unwrap();
    std::fs::write(dir.path().join("steel.yaml"), STEEL_YAML).unwrap();
    dir
}

fn sectors() -> Vec<String> {
    vec!["cement".into(), "steel".into()]
}

async fn select(engine: &dyn LcaEngine, ctx: &EngineContext) -> Vec<SelectedMethod> {
    let mut finder = MethodFinder::from_engine(engine, ctx).await.unwrap();
    finder
        .find_and_add(&["GWP100".into()], &[], Some("gwp100"))
        .unwrap();
    finder
        .find_and_add(&["climate change".into()], &["GWP100".into()], None)
        .unwrap();
    finder.into_selected()
}

async fn pipeline(
    engine: &dyn LcaEngine,
    mapping: &Path,
    databases: &[String],
    cutoff: f64,
) -> (SectorSets, BatchOutcome) {
    let ctx = engine.open_project(PROJECT).await.unwrap();
    let mappings = load_sector_mappings(mapping, &sectors(), "ecoinvent_aliases").unwrap();
    let sets = collect_sector_sets(engine, &ctx, databases, &mappings)
        .await
        .unwrap();
    let methods = select(engine, &ctx).await;

    let builder = ScoreTableBuilder::new(engine, ctx);
    let outcome = BatchRunner::new(builder, cutoff)
        .with_concurrency(2)
        .run(&sets.by_sector(), &methods)
        .await;
    (sets, outcome)
}

fn ei() -> Vec<String> {
    vec!["ei".into()]
}

// ── Pipeline ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_matching_respects_filter_and_mask() {
    let engine = engine();
    let dir = mapping_dir();
    let (sets, _) = pipeline(&engine, dir.path(), &ei(), 0.01).await;

    assert!(sets.failed.is_empty());
    let cement = sets.sector("cement");
    assert_eq!(cement.len(), 2);
    assert!(cement.contains(&ActivityKey::new("ei", "c1")));
    assert!(cement.contains(&ActivityKey::new("ei", "k1")));
    assert!(!cement.contains(&ActivityKey::new("ei", "c2")));

    let steel = sets.sector("steel");
    assert_eq!(steel.len(), 1);
    assert!(steel.contains(&ActivityKey::new("ei", "s1")));
}

#[tokio::test]
async fn e2e_sets_union_across_databases() {
    let engine = engine();
    let dir = mapping_dir();
    let (sets, _) = pipeline(&engine, dir.path(), &[], 0.01).await;

    let technologies = &sets.technologies["cement"];
    assert_eq!(technologies["cement, Portland"].len(), 2);
    assert!(technologies["clinker"].contains(&ActivityKey::new("premise", "k1")));
    assert_eq!(sets.sector("cement").len(), 4);
}

#[tokio::test]
async fn e2e_scores_and_aggregates_every_unit() {
    let engine = engine();
    let dir = mapping_dir();
    let (_, outcome) = pipeline(&engine, dir.path(), &ei(), 0.01).await;

    assert!(outcome.is_complete(), "failures: {:?}", outcome.failures);
    assert_eq!(outcome.units, 4);
    assert_eq!(outcome.succeeded(), 4);
    assert_eq!(engine.calls(), 3 * 2);

    let cement = &outcome.tables["cement"]["gwp100"];
    // descending totals after aggregation
    assert_eq!(cement.rows[0].key.code, "c1");
    assert_eq!(cement.totals(), vec![100.0, 85.0]);
    assert_eq!(cement.value(0, "4: transport"), Some(0.0));
    assert_eq!(cement.value(0, "other"), Some(0.5));
    assert_eq!(cement.value(1, "4: transport"), Some(1.0));
    for row in &cement.rows {
        assert!((row.contribution_sum() - row.total).abs() < 1e-9);
    }

    let steel = &outcome.tables["steel"]["method_1"];
    assert_eq!(steel.method, gwp20());
    assert!(steel.category_index("Unnamed: 3").is_none());
    assert_eq!(steel.value(0, "other"), Some(30.0 * 1.25));
}

#[tokio::test]
async fn e2e_report_written_and_readable() {
    let engine = engine();
    let dir = mapping_dir();
    let (_, outcome) = pipeline(&engine, dir.path(), &ei(), 0.01).await;

    let metadata = WorkbookMetadata::new(PROJECT)
        .with_databases(ei())
        .with_cutoff(0.01);
    let workbook = ReportAssembler::default().assemble(&outcome.tables, metadata);

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("reports/dopo.json");
    JsonWorkbookExporter::new().export(&workbook, &path).unwrap();

    let back: Workbook = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        back.sheet_names(),
        [
            "cement",
            "steel",
            "cement_gwp100",
            "cement_method_1",
            "steel_gwp100",
            "steel_method_1"
        ]
    );
    assert_eq!(back.metadata.cutoff, Some(0.01));

    let sheet = back.sheet("cement_gwp100").unwrap();
    assert_eq!(sheet.cell(0, "code").and_then(Cell::as_str), Some("c1"));
    assert_eq!(sheet.cell(0, TOTAL_COLUMN).and_then(Cell::as_f64), Some(100.0));
    assert_eq!(sheet.cell(0, "rank").and_then(Cell::as_f64), Some(1.0));
    assert_eq!(sheet.cell(0, "clinker").and_then(Cell::as_f64), Some(80.0));
    assert_eq!(sheet.cell(0, "sector").and_then(Cell::as_str), Some("cement"));
    assert_eq!(sheet.charts.len(), 2);
    assert_eq!(sheet.charts[0].kind, ChartKind::Scatter);

    let combined = back.sheet("cement").unwrap();
    assert_eq!(combined.len(), 4);
}

#[tokio::test]
async fn e2e_report_without_combined_sheets() {
    let engine = engine();
    let dir = mapping_dir();
    let (_, outcome) = pipeline(&engine, dir.path(), &ei(), 0.01).await;

    let workbook = ReportAssembler::new(AssemblyOptions {
        combined_sheets: false,
        ..AssemblyOptions::default()
    })
    .assemble(&outcome.tables, WorkbookMetadata::new(PROJECT));
    assert_eq!(workbook.sheets.len(), 4);
    assert!(workbook.sheet("cement").is_none());
}

// ── Failure handling ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_failed_unit_does_not_stop_the_batch() {
    let engine = engine().with_failure(&ActivityKey::new("ei", "s1"), &gwp100());
    let dir = mapping_dir();
    let (_, outcome) = pipeline(&engine, dir.path(), &ei(), 0.01).await;

    assert_eq!(outcome.units, 4);
    assert_eq!(outcome.succeeded(), 3);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].sector, "steel");
    assert_eq!(outcome.failures[0].method_key, "gwp100");
    assert!(outcome.failures[0].to_string().contains("injected failure"));

    let workbook = ReportAssembler::default()
        .assemble(&outcome.tables, WorkbookMetadata::new(PROJECT));
    assert!(workbook.sheet("steel_method_1").is_some());
    assert!(workbook.sheet("steel_gwp100").is_none());
}

#[tokio::test]
async fn e2e_ambiguous_method_is_rejected() {
    let engine = engine();
    let ctx = engine.open_project(PROJECT).await.unwrap();
    let mut finder = MethodFinder::from_engine(&engine, &ctx).await.unwrap();

    let err = finder.find_and_add(&["IPCC".into()], &[], None).unwrap_err();
    match err {
        ScoreError::AmbiguousMethod { candidates, .. } => assert_eq!(candidates.len(), 2),
        other => panic!("expected AmbiguousMethod, got {other:?}"),
    }
    assert!(finder.selected().is_empty());
}

#[tokio::test]
async fn e2e_unknown_sector_lists_valid_ones() {
    let dir = mapping_dir();
    let err = load_sector_mappings(dir.path(), &["cheese".into()], "ecoinvent_aliases")
        .unwrap_err();
    match err {
        ConfigError::ValidationError(msg) => {
            assert!(msg.contains("cheese"));
            assert!(msg.contains("cement, steel"));
        }
        other => panic!("expected ValidationError, got {other:?}"),
    }
}

// ── Comparison ───────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_compare_databases() {
    let engine = engine();
    let dir = mapping_dir();
    let (_, base) = pipeline(&engine, dir.path(), &ei(), 0.01).await;
    let (_, other) = pipeline(&engine, dir.path(), &["premise".into()], 0.01).await;

    let comparisons = compare_all(&base.tables, &other.tables).unwrap();
    assert_eq!(comparisons.len(), 4);

    let steel = comparisons
        .iter()
        .find(|c| c.sector == "steel" && c.method_key == "gwp100")
        .unwrap();
    assert_eq!(steel.changes[0].relative_change, 100.0);

    let cement = comparisons
        .iter()
        .find(|c| c.sector == "cement" && c.method_key == "gwp100")
        .unwrap();
    assert!(cement.changes.iter().all(|c| c.relative_change == -50.0));
    assert!(cement.changes.iter().all(|c| c.rank == 1));
    assert!(cement.unmatched.is_empty());

    let workbook = comparison_workbook(&comparisons, WorkbookMetadata::new(PROJECT));
    assert_eq!(workbook.sheets.len(), 4);
    assert!(workbook.sheet("unmatched").is_none());
}

// ── Config + snapshot ────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_snapshot_engine_matches_in_memory() {
    let memory = engine();
    let dir = mapping_dir();
    let snapshot_path = dir.path().join("inventory.json");
    SnapshotEngine::write(memory.inventory(), &snapshot_path).unwrap();

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
project = "{PROJECT}"
databases = ["ei"]
mapping_dir = "{}"
sectors = ["cement", "steel"]
cutoff = 0.01

[inventory]
snapshot = "{}"

[[methods]]
criteria = ["GWP100"]
key = "gwp100"
"#,
            dir.path().display(),
            snapshot_path.display()
        ),
    )
    .unwrap();

    let config = AppConfig::load_from(&config_path).unwrap();
    let snapshot = SnapshotEngine::open(config.inventory.snapshot.as_ref().unwrap()).unwrap();
    assert_eq!(snapshot.name(), "snapshot");

    let (_, from_snapshot) =
        pipeline(&snapshot, &config.mapping_dir, &config.databases, config.cutoff).await;
    let (_, from_memory) = pipeline(&memory, dir.path(), &ei(), 0.01).await;

    let tables = |o: &BatchOutcome| -> BTreeMap<(String, String), Vec<f64>> {
        o.tables
            .iter()
            .flat_map(|(s, methods)| {
                methods
                    .iter()
                    .map(move |(k, t)| ((s.clone(), k.clone()), t.totals()))
            })
            .collect()
    };
    assert_eq!(tables(&from_snapshot), tables(&from_memory));
}
