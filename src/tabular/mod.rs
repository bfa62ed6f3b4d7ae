//! Spreadsheet exchange for ledger transactions.
//!
//! Workbooks are first lowered into a small in-memory table model so sheet
//! resolution and row parsing can run without touching the filesystem. The
//! `xlsx` readers and writers sit at the edges.

pub mod export;
pub mod import;

use thiserror::Error;

pub use export::{export_rows, export_table, write_xlsx, ExportRow};
pub use import::{import_file, import_workbook, read_workbook, ImportOptions};

pub const SHEET_NAME: &str = "Transacciones";
pub const DEFAULT_FILE_NAME: &str = "FinCommand_Data.xlsx";

pub const HEADERS: [&str; 7] = [
    "Fecha",
    "Mes",
    "Tipo",
    "Concepto",
    "Monto RD",
    "Monto US",
    "Empresa ID",
];

pub const COLUMN_WIDTHS: [f64; 7] = [12.0, 10.0, 10.0, 30.0, 12.0, 12.0, 10.0];

/// Failures raised while turning a workbook into transactions.
#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("no se encontraron datos válidos en el archivo")]
    NoValidData,
    #[error("the workbook has no sheets")]
    EmptyWorkbook,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(value) => Some(value.to_string()),
            CellValue::Bool(value) => Some(value.to_string()),
        }
    }

    /// Numeric reading of the cell; text is parsed after stripping grouping commas.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => text.trim().replace(',', "").parse().ok(),
            CellValue::Bool(_) | CellValue::Empty => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One worksheet; the first row holds the headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetTable {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_row<I, C>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellValue>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_text().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Data rows as header-keyed records, skipping rows with no content.
    pub fn records(&self) -> Vec<Record<'_>> {
        let headers = self.headers();
        self.rows
            .iter()
            .skip(1)
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| Record {
                headers: headers.clone(),
                cells: row,
            })
            .collect()
    }
}

/// A data row addressed by header name.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    headers: Vec<String>,
    cells: &'a [CellValue],
}

impl<'a> Record<'a> {
    /// First non-empty cell among `keys`, compared case-insensitively.
    pub fn get(&self, keys: &[&str]) -> Option<&'a CellValue> {
        keys.iter().find_map(|key| {
            let index = self
                .headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(key))?;
            self.cells.get(index).filter(|cell| !cell.is_empty())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookTable {
    pub sheets: Vec<SheetTable>,
}

impl WorkbookTable {
    pub fn new(sheets: Vec<SheetTable>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// First sheet whose lowercase name contains `marker`.
    pub fn sheet_containing(&self, marker: &str) -> Option<&SheetTable> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name.to_lowercase().contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_skip_blank_rows_and_match_headers_loosely() {
        let sheet = SheetTable::new("Hoja1")
            .with_row(["fecha", "Monto RD"])
            .with_row([CellValue::Empty, CellValue::Text("  ".into())])
            .with_row([CellValue::from("2024-02-01"), CellValue::Number(50.0)]);
        let records = sheet.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get(&["Fecha", "Date"]),
            Some(&CellValue::Text("2024-02-01".into()))
        );
        assert_eq!(records[0].get(&["Monto RD"]).and_then(CellValue::as_number), Some(50.0));
    }

    #[test]
    fn text_amounts_drop_grouping() {
        assert_eq!(CellValue::from("1,250.75").as_number(), Some(1250.75));
        assert_eq!(CellValue::from("n/a").as_number(), None);
    }
}
