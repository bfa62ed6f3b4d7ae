use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::{CellValue, ImportError, Record, SheetTable, WorkbookTable, SHEET_NAME};
use crate::errors::LedgerError;
use crate::ledger::{month_name, Transaction, TransactionType};

const IMPORTED: &str = "Importado";
const EXCEL_EPOCH_OFFSET_DAYS: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATE_KEYS: [&str; 2] = ["Fecha", "Date"];
const DESCRIPTION_KEYS: [&str; 3] = ["Descripcion", "Descripción", "Concepto"];
const LOCAL_KEYS: [&str; 2] = ["Monto RD", "RD$"];
const FOREIGN_KEYS: [&str; 2] = ["Monto US", "US$"];
const TYPE_KEYS: [&str; 1] = ["Tipo"];
const MONTH_KEYS: [&str; 1] = ["Mes"];

const TEXT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Caller context for an import.
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Ledger group every imported row is assigned to.
    pub company_id: Uuid,
    /// Type used for rows that carry no `Tipo` value.
    pub active_section: TransactionType,
    pub today: NaiveDate,
}

impl ImportOptions {
    pub fn new(company_id: Uuid, active_section: TransactionType) -> Self {
        Self {
            company_id,
            active_section,
            today: chrono::Local::now().date_naive(),
        }
    }
}

/// Resolves which sheets to read and converts their rows into transactions.
///
/// A `Transacciones` sheet wins. Otherwise the first sheet named like
/// "ingreso" is read as income and the first named like "gasto" as expense.
/// Failing both, the first sheet is read with per-row types.
pub fn import_workbook(
    workbook: &WorkbookTable,
    options: &ImportOptions,
) -> Result<Vec<Transaction>, ImportError> {
    let first = workbook.sheets.first().ok_or(ImportError::EmptyWorkbook)?;
    let mut imported = Vec::new();

    if let Some(sheet) = workbook.sheet(SHEET_NAME) {
        debug!(sheet = %sheet.name, "importing transactions sheet");
        imported.extend(parse_sheet(sheet, None, options));
    } else {
        let income = workbook.sheet_containing("ingreso");
        let expense = workbook.sheet_containing("gasto");
        if income.is_some() || expense.is_some() {
            if let Some(sheet) = income {
                debug!(sheet = %sheet.name, "importing income sheet");
                imported.extend(parse_sheet(sheet, Some(TransactionType::Income), options));
            }
            if let Some(sheet) = expense {
                debug!(sheet = %sheet.name, "importing expense sheet");
                imported.extend(parse_sheet(sheet, Some(TransactionType::Expense), options));
            }
        } else {
            debug!(sheet = %first.name, "importing first sheet");
            imported.extend(parse_sheet(first, None, options));
        }
    }

    if imported.is_empty() {
        return Err(ImportError::NoValidData);
    }
    Ok(imported)
}

fn parse_sheet(
    sheet: &SheetTable,
    override_type: Option<TransactionType>,
    options: &ImportOptions,
) -> Vec<Transaction> {
    sheet
        .records()
        .iter()
        .map(|record| parse_record(record, override_type, options))
        .collect()
}

fn parse_record(
    record: &Record<'_>,
    override_type: Option<TransactionType>,
    options: &ImportOptions,
) -> Transaction {
    let parsed_date = match record.get(&DATE_KEYS) {
        Some(cell) => parse_date(cell),
        None => Some(options.today),
    };
    let (date, month, year) = match parsed_date {
        Some(date) => (date, month_name(date.month()).to_string(), date.year()),
        None => (
            options.today,
            record
                .get(&MONTH_KEYS)
                .and_then(CellValue::as_text)
                .unwrap_or_else(|| IMPORTED.to_string()),
            options.today.year(),
        ),
    };

    let kind = override_type.unwrap_or_else(|| {
        match record.get(&TYPE_KEYS).and_then(CellValue::as_text) {
            Some(raw) if raw.to_lowercase().contains("gasto") => TransactionType::Expense,
            Some(_) => TransactionType::Income,
            None => options.active_section,
        }
    });

    Transaction {
        id: Uuid::new_v4(),
        date,
        month,
        year,
        category: IMPORTED.into(),
        description: record
            .get(&DESCRIPTION_KEYS)
            .and_then(CellValue::as_text)
            .unwrap_or_else(|| IMPORTED.to_string()),
        amount_local: amount(record, &LOCAL_KEYS),
        amount_foreign: amount(record, &FOREIGN_KEYS),
        payment_method: IMPORTED.into(),
        company_id: options.company_id,
        kind,
    }
}

fn amount(record: &Record<'_>, keys: &[&str]) -> f64 {
    record
        .get(keys)
        .and_then(CellValue::as_number)
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Serial day numbers count from 1899-12-30; text is tried against common layouts.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Number(serial) => serial_to_date(*serial),
        CellValue::Text(text) => parse_date_text(text.trim()),
        CellValue::Bool(_) | CellValue::Empty => None,
    }
}

pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - EXCEL_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round() as i64;
    DateTime::from_timestamp_millis(millis).map(|instant| instant.date_naive())
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|instant| instant.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|stamp| stamp.date())
        })
}

/// Loads every sheet of an `xlsx`/`xls`/`ods` file into the table model.
pub fn read_workbook(path: &Path) -> Result<WorkbookTable, LedgerError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)?;
    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        sheets.push(SheetTable { name, rows });
    }
    Ok(WorkbookTable::new(sheets))
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(stamp) => CellValue::Number(stamp.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

/// Reads `path` and imports its rows in one step.
pub fn import_file(path: &Path, options: &ImportOptions) -> Result<Vec<Transaction>, LedgerError> {
    let workbook = read_workbook(path)?;
    let imported = import_workbook(&workbook, options)?;
    info!(rows = imported.len(), path = %path.display(), "imported transactions");
    Ok(imported)
}
