use std::path::Path;

use rust_xlsxwriter::Workbook as XlsxWorkbook;
use tracing::info;

use super::{CellValue, SheetTable, COLUMN_WIDTHS, HEADERS, SHEET_NAME};
use crate::errors::LedgerError;
use crate::ledger::Transaction;

/// Flat spreadsheet shape of one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub date: String,
    pub month: String,
    pub kind: String,
    pub description: String,
    pub amount_local: f64,
    pub amount_foreign: f64,
    pub company_id: String,
}

impl ExportRow {
    /// Example row written when there is nothing to export.
    pub fn template() -> Self {
        Self {
            date: "2024-01-01".into(),
            month: "Enero".into(),
            kind: "Ingreso".into(),
            description: "Ejemplo de formato".into(),
            amount_local: 1000.0,
            amount_foreign: 0.0,
            company_id: "1".into(),
        }
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.date.clone()),
            CellValue::Text(self.month.clone()),
            CellValue::Text(self.kind.clone()),
            CellValue::Text(self.description.clone()),
            CellValue::Number(self.amount_local),
            CellValue::Number(self.amount_foreign),
            CellValue::Text(self.company_id.clone()),
        ]
    }
}

impl From<&Transaction> for ExportRow {
    fn from(txn: &Transaction) -> Self {
        Self {
            date: txn.date.format("%Y-%m-%d").to_string(),
            month: txn.month.clone(),
            kind: txn.kind.label().to_string(),
            description: txn.description.clone(),
            amount_local: txn.amount_local,
            amount_foreign: txn.amount_foreign,
            company_id: txn.company_id.to_string(),
        }
    }
}

/// Rows in input order; an empty input yields exactly the template row.
pub fn export_rows(transactions: &[Transaction]) -> Vec<ExportRow> {
    if transactions.is_empty() {
        return vec![ExportRow::template()];
    }
    transactions.iter().map(ExportRow::from).collect()
}

/// The `Transacciones` sheet with headers followed by the export rows.
pub fn export_table(transactions: &[Transaction]) -> SheetTable {
    let mut sheet = SheetTable::new(SHEET_NAME).with_row(HEADERS);
    sheet
        .rows
        .extend(export_rows(transactions).iter().map(ExportRow::cells));
    sheet
}

fn build_workbook(transactions: &[Transaction]) -> Result<XlsxWorkbook, LedgerError> {
    let table = export_table(transactions);
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col16 = col_idx as u16;
            match cell {
                CellValue::Text(text) => {
                    worksheet.write_string(row32, col16, text)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(row32, col16, *value)?;
                }
                CellValue::Bool(value) => {
                    worksheet.write_boolean(row32, col16, *value)?;
                }
                CellValue::Empty => {}
            }
        }
    }
    Ok(workbook)
}

pub fn write_xlsx(transactions: &[Transaction], path: &Path) -> Result<(), LedgerError> {
    let mut workbook = build_workbook(transactions)?;
    workbook.save(path)?;
    info!(
        rows = transactions.len(),
        path = %path.display(),
        "exported transactions"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::DualAmount;
    use crate::ledger::TransactionType;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn empty_export_is_the_template() {
        let table = export_table(&[]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.headers(), HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>());
        assert_eq!(export_rows(&[]), vec![ExportRow::template()]);
    }

    #[test]
    fn rows_use_localized_type_labels() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let txn = Transaction::new(
            Uuid::new_v4(),
            TransactionType::Expense,
            date,
            DualAmount::new(250.0, 4.27),
        );
        let rows = export_rows(std::slice::from_ref(&txn));
        assert_eq!(rows[0].kind, "Gasto");
        assert_eq!(rows[0].date, "2024-06-02");
        assert_eq!(rows[0].month, "Junio");
        assert_eq!(rows[0].company_id, txn.company_id.to_string());
    }
}
