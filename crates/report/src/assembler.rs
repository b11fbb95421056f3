//! Report assembly: aggregated score tables → workbook sheets.
//!
//! Method sheet layout:
//!
//! ```text
//! activity | database | code | reference product | location | unit |
//! method | method unit | sector | total | rank | mean | 2std_abv |
//! 2std_blw | q1 | q3 | <contribution columns ...> | other
//! ```
//!
//! Statistic columns are present only when enabled. Combined sheets (one
//! per sector, all its method sheets stacked, gaps filled with 0) come
//! first in the workbook, followed by the method sheets.

use crate::labels::clean_labels;
use crate::naming::SheetNamer;
use crate::workbook::{Cell, ChartKind, ChartSpec, SeriesSpec, Sheet, Workbook, WorkbookMetadata};
use dopo_core::{IDENTITY_COLUMNS, ScoreTable, TOTAL_COLUMN};
use dopo_scores::{Comparison, STATISTIC_COLUMNS, SectorTables, TableStatistics};
use tracing::{debug, info};

pub const SECTOR_COLUMN: &str = "sector";

/// What to include in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub combined_sheets: bool,
    pub statistics: bool,
    pub charts: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            combined_sheets: true,
            statistics: true,
            charts: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    options: AssemblyOptions,
}

impl ReportAssembler {
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    /// Build the workbook for `sector → method_key → table`.
    pub fn assemble(&self, tables: &SectorTables, metadata: WorkbookMetadata) -> Workbook {
        let mut namer = SheetNamer::new();
        let mut workbook = Workbook::new(metadata);

        let method_sheets: Vec<(String, Vec<Sheet>)> = tables
            .iter()
            .map(|(sector, methods)| {
                let sheets = methods.values().map(|t| self.method_sheet(t)).collect();
                (sector.clone(), sheets)
            })
            .collect();

        if self.options.combined_sheets {
            for (sector, sheets) in &method_sheets {
                let mut combined = combine(sector, sheets);
                combined.name = namer.name(sector);
                workbook.sheets.push(combined);
            }
        }

        for (sector, sheets) in method_sheets {
            for mut sheet in sheets {
                let raw = format!("{sector}_{}", sheet.method_key.as_deref().unwrap_or_default());
                sheet.name = namer.name(&raw);
                workbook.sheets.push(sheet);
            }
        }

        info!(sheets = workbook.sheets.len(), "Workbook assembled");
        workbook
    }

    /// One table as a sheet. The name is set by the caller.
    pub fn method_sheet(&self, table: &ScoreTable) -> Sheet {
        let stats = if self.options.statistics {
            TableStatistics::compute(&table.totals())
        } else {
            None
        };
        let stat_columns: &[&str] = if self.options.statistics {
            &STATISTIC_COLUMNS
        } else {
            &[]
        };

        let mut columns: Vec<String> = IDENTITY_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.push(SECTOR_COLUMN.to_string());
        columns.push(TOTAL_COLUMN.to_string());
        columns.extend(stat_columns.iter().map(|c| c.to_string()));
        let first_contribution = columns.len();
        columns.extend(clean_labels(&table.categories, &columns));

        let mut sheet = Sheet::new(String::new(), columns);
        sheet.sector = Some(table.sector.clone());
        sheet.method_key = Some(table.method_key.clone());

        for (i, row) in table.rows.iter().enumerate() {
            let mut cells: Vec<Cell> = vec![
                row.activity.as_str().into(),
                row.key.database.as_str().into(),
                row.key.code.as_str().into(),
                row.reference_product.clone().into(),
                row.location.as_str().into(),
                row.unit.as_str().into(),
                table.method.short_name().into(),
                table.method_unit.as_str().into(),
                table.sector.as_str().into(),
                row.total.into(),
            ];
            if self.options.statistics {
                match &stats {
                    Some(s) => {
                        cells.push((s.rank[i] as f64).into());
                        for column in &STATISTIC_COLUMNS[1..] {
                            cells.push(s.summary(column).map(Cell::Number).unwrap_or(Cell::Empty));
                        }
                    }
                    None => cells.extend(std::iter::repeat_n(Cell::Empty, STATISTIC_COLUMNS.len())),
                }
            }
            cells.extend(row.values.iter().map(|v| Cell::Number(*v)));
            sheet.rows.push(cells);
        }

        if self.options.charts && !sheet.is_empty() {
            sheet.charts = charts(&sheet, table, first_contribution);
        }

        debug!(
            sector = %table.sector,
            method = %table.method_key,
            rows = sheet.len(),
            columns = sheet.columns.len(),
            "Method sheet built"
        );
        sheet
    }
}

fn charts(sheet: &Sheet, table: &ScoreTable, first_contribution: usize) -> Vec<ChartSpec> {
    let mut out = Vec::new();
    let indicator = table.method.short_name();
    let rank = sheet.column_index("rank");

    if let (Some(rank), Some(total)) = (rank, sheet.column_index(TOTAL_COLUMN)) {
        let mut series = vec![SeriesSpec {
            name: TOTAL_COLUMN.to_string(),
            column: total,
        }];
        for name in ["mean", "q1", "q3", "2std_abv", "2std_blw"] {
            if let Some(column) = sheet.column_index(name) {
                series.push(SeriesSpec {
                    name: name.to_string(),
                    column,
                });
            }
        }
        out.push(ChartSpec {
            kind: ChartKind::Scatter,
            title: format!("{indicator} LCA scores for {} sector", table.sector),
            x_axis: "activity rank".into(),
            y_axis: table.method_unit.clone(),
            x_column: rank,
            series,
            rows: sheet.len(),
        });
    }

    let contributions: Vec<SeriesSpec> = (first_contribution..sheet.columns.len())
        .map(|column| SeriesSpec {
            name: sheet.columns[column].clone(),
            column,
        })
        .collect();
    if !contributions.is_empty() {
        out.push(ChartSpec {
            kind: ChartKind::StackedBar,
            title: format!("{} sector inputs contributions to {indicator}", table.sector),
            x_axis: "activity index".into(),
            y_axis: table.method_unit.clone(),
            x_column: rank.unwrap_or(0),
            series: contributions,
            rows: sheet.len(),
        });
    }
    out
}

/// Whether a method-sheet column holds numbers: `total`, the statistics and
/// the contributions. Identity columns and the sector marker hold text.
fn is_numeric_column(column: &str) -> bool {
    column != SECTOR_COLUMN && !IDENTITY_COLUMNS.contains(&column)
}

/// Stack a sector's method sheets. Columns are the union in order of first
/// appearance; missing numeric cells are 0, missing text cells stay empty.
fn combine(sector: &str, sheets: &[Sheet]) -> Sheet {
    let mut columns: Vec<String> = Vec::new();
    for sheet in sheets {
        for c in &sheet.columns {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }

    let mut combined = Sheet::new(sector, columns);
    combined.sector = Some(sector.to_string());
    for sheet in sheets {
        let positions: Vec<(Option<usize>, bool)> = combined
            .columns
            .iter()
            .map(|c| (sheet.column_index(c), is_numeric_column(c)))
            .collect();
        for row in &sheet.rows {
            combined.rows.push(
                positions
                    .iter()
                    .map(|(p, numeric)| match p.and_then(|i| row.get(i)) {
                        Some(Cell::Empty) | None if *numeric => Cell::Number(0.0),
                        Some(Cell::Empty) | None => Cell::Empty,
                        Some(cell) => cell.clone(),
                    })
                    .collect(),
            );
        }
    }
    combined
}

/// Column layout of a comparison sheet.
pub const COMPARISON_COLUMNS: [&str; 11] = [
    "sector",
    "method",
    "method unit",
    "code",
    "activity",
    "reference product",
    "location",
    "base total",
    "other total",
    "relative change",
    "rank",
];

/// One sheet per compared (sector, method) unit, plus an `unmatched` sheet
/// listing activities found in only one database.
pub fn comparison_workbook(comparisons: &[Comparison], metadata: WorkbookMetadata) -> Workbook {
    let mut namer = SheetNamer::new();
    let mut workbook = Workbook::new(metadata);
    let mut unmatched = Sheet::new(
        String::new(),
        ["sector", "method", "database", "code"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );

    for cmp in comparisons {
        let mut sheet = Sheet::new(
            namer.name(&format!("{}_{}", cmp.sector, cmp.method_key)),
            COMPARISON_COLUMNS.iter().map(|c| c.to_string()).collect(),
        );
        sheet.sector = Some(cmp.sector.clone());
        sheet.method_key = Some(cmp.method_key.clone());
        for c in &cmp.changes {
            sheet.rows.push(vec![
                cmp.sector.as_str().into(),
                cmp.method.short_name().into(),
                cmp.method_unit.as_str().into(),
                c.code.as_str().into(),
                c.activity.as_str().into(),
                c.reference_product.clone().into(),
                c.location.as_str().into(),
                c.base_total.into(),
                c.other_total.into(),
                c.relative_change.into(),
                (c.rank as f64).into(),
            ]);
        }
        for key in &cmp.unmatched {
            unmatched.rows.push(vec![
                cmp.sector.as_str().into(),
                cmp.method.short_name().into(),
                key.database.as_str().into(),
                key.code.as_str().into(),
            ]);
        }
        workbook.sheets.push(sheet);
    }

    if !unmatched.is_empty() {
        unmatched.name = namer.name("unmatched");
        workbook.sheets.push(unmatched);
    }
    workbook
}
