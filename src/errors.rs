use thiserror::Error;

use crate::tabular::ImportError;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

impl From<rust_xlsxwriter::XlsxError> for LedgerError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        LedgerError::Spreadsheet(err.to_string())
    }
}

impl From<calamine::Error> for LedgerError {
    fn from(err: calamine::Error) -> Self {
        LedgerError::Spreadsheet(err.to_string())
    }
}
