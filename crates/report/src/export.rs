//! Workbook exporters.
//!
//! [`JsonWorkbookExporter`] writes the full workbook (metadata, sheets,
//! chart specs). [`JsonRecordsExporter`] writes JSON Lines, one dashboard
//! table per line.

use crate::workbook::Workbook;
use dopo_core::ExportError;
use std::path::Path;
use tracing::info;

/// Serializes a workbook to a file.
pub trait Exporter: Send + Sync {
    fn name(&self) -> &str;

    fn export(&self, workbook: &Workbook, path: &Path) -> Result<(), ExportError>;
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    let write_err = |e: std::io::Error| ExportError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, content).map_err(write_err)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWorkbookExporter {
    compact: bool,
}

impl JsonWorkbookExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-line output instead of pretty-printed.
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }
}

impl Exporter for JsonWorkbookExporter {
    fn name(&self) -> &str {
        "json"
    }

    fn export(&self, workbook: &Workbook, path: &Path) -> Result<(), ExportError> {
        if workbook.is_empty() {
            return Err(ExportError::EmptyWorkbook);
        }
        let content = if self.compact {
            serde_json::to_string(workbook)
        } else {
            serde_json::to_string_pretty(workbook)
        }
        .map_err(|e| ExportError::Encode(e.to_string()))?;

        write_file(path, &content)?;
        info!(path = %path.display(), sheets = workbook.sheets.len(), "Workbook written");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordsExporter;

impl Exporter for JsonRecordsExporter {
    fn name(&self) -> &str {
        "records"
    }

    fn export(&self, workbook: &Workbook, path: &Path) -> Result<(), ExportError> {
        if workbook.is_empty() {
            return Err(ExportError::EmptyWorkbook);
        }
        let mut content = String::new();
        for table in workbook.records() {
            let line =
                serde_json::to_string(&table).map_err(|e| ExportError::Encode(e.to_string()))?;
            content.push_str(&line);
            content.push('\n');
        }

        write_file(path, &content)?;
        info!(path = %path.display(), tables = workbook.sheets.len(), "Dashboard records written");
        Ok(())
    }
}

/// Exporter for a file extension: `.jsonl` → records, anything else → workbook.
pub fn exporter_for(path: &Path) -> Box<dyn Exporter> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") => Box::new(JsonRecordsExporter),
        _ => Box::new(JsonWorkbookExporter::new()),
    }
}
