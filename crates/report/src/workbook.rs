//! Export-ready workbook model: named sheets of cells plus chart specs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cell. Serialized as a bare string, number or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Option<String>> for Cell {
    fn from(s: Option<String>) -> Self {
        s.map(Cell::Text).unwrap_or(Cell::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    StackedBar,
}

/// A data series: a column plotted against the chart's x column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub name: String,
    /// Zero-based column index in the sheet.
    pub column: usize,
}

/// Where a chart takes its data from. Series span all data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    /// Zero-based column holding x values (scatter) or categories (bar).
    pub x_column: usize,
    pub series: Vec<SeriesSpec>,
    pub rows: usize,
}

/// A named, rectangular table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_key: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartSpec>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            sector: None,
            method_key: None,
            columns,
            rows: Vec::new(),
            charts: Vec::new(),
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// All cells of one column.
    pub fn column(&self, column: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Provenance of a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookMetadata {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub project: String,
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
    pub generator: String,
}

impl WorkbookMetadata {
    /// Fresh metadata for a run over `project`.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            project: project.into(),
            databases: Vec::new(),
            cutoff: None,
            generator: format!("dopo {}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_databases(mut self, databases: Vec<String>) -> Self {
        self.databases = databases;
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
}

/// Sheets in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub metadata: WorkbookMetadata,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(metadata: WorkbookMetadata) -> Self {
        Self {
            metadata,
            sheets: Vec::new(),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
