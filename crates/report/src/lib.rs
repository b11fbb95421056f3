//! # dopo Report
//!
//! Turns aggregated score tables into an export-ready [`Workbook`]:
//! one combined sheet per sector, one sheet per (sector, method) with
//! statistic columns and chart specifications, and unique spreadsheet-safe
//! sheet names. Every sheet is also available as dashboard records.

pub mod assembler;
pub mod export;
pub mod labels;
pub mod naming;
pub mod records;
pub mod workbook;

pub use assembler::{
    AssemblyOptions, COMPARISON_COLUMNS, ReportAssembler, SECTOR_COLUMN, comparison_workbook,
};
pub use export::{Exporter, JsonRecordsExporter, JsonWorkbookExporter, exporter_for};
pub use labels::{clean_label, clean_labels};
pub use naming::{MAX_SHEET_NAME, SheetNamer, sanitize};
pub use records::TableRecords;
pub use workbook::{Cell, ChartKind, ChartSpec, SeriesSpec, Sheet, Workbook, WorkbookMetadata};
