//! Dashboard records: a sheet as a list of JSON objects.
//!
//! Each row becomes an object whose keys follow the sheet's column order.

use crate::workbook::{Cell, Sheet, Workbook};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

/// A borrowed view of one sheet, serialized as
/// `{"name": ..., "columns": [...], "records": [{col: value, ...}, ...]}`.
#[derive(Debug, Clone, Copy)]
pub struct TableRecords<'a> {
    sheet: &'a Sheet,
}

impl<'a> TableRecords<'a> {
    pub fn new(sheet: &'a Sheet) -> Self {
        Self { sheet }
    }

    pub fn name(&self) -> &str {
        &self.sheet.name
    }

    pub fn len(&self) -> usize {
        self.sheet.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheet.rows.is_empty()
    }
}

struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

struct Records<'a>(&'a Sheet);

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.rows.len()))?;
        for cells in &self.0.rows {
            seq.serialize_element(&Record {
                columns: &self.0.columns,
                cells,
            })?;
        }
        seq.end()
    }
}

impl Serialize for TableRecords<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TableRecords", 3)?;
        s.serialize_field("name", &self.sheet.name)?;
        s.serialize_field("columns", &self.sheet.columns)?;
        s.serialize_field("records", &Records(self.sheet))?;
        s.end()
    }
}

impl Sheet {
    pub fn records(&self) -> TableRecords<'_> {
        TableRecords::new(self)
    }
}

impl Workbook {
    /// Every sheet as dashboard records, in sheet order.
    pub fn records(&self) -> Vec<TableRecords<'_>> {
        self.sheets.iter().map(Sheet::records).collect()
    }
}
