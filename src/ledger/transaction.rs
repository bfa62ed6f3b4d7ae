use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::DualAmount;
use crate::errors::LedgerError;

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub const INCOME_CATEGORIES: [&str; 4] = [
    "Recaudos de plataformas",
    "Retiros",
    "Ventas Directas",
    "Otros",
];

pub const EXPENSE_CATEGORIES: [&str; 9] = [
    "Pago de tarjeta de crédito",
    "Publicidad",
    "Mercancía",
    "Préstamos",
    "Flete",
    "Servicio al cliente",
    "Préstamos de urgencia",
    "Nómina",
    "Otros",
];

/// Spanish month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Label used in spreadsheets and notices.
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Income => "Ingreso",
            TransactionType::Expense => "Gasto",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub month: String,
    pub year: i32,
    pub category: String,
    pub description: String,
    pub amount_local: f64,
    pub amount_foreign: f64,
    pub payment_method: String,
    pub company_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    pub fn new(
        company_id: Uuid,
        kind: TransactionType,
        date: NaiveDate,
        amount: DualAmount,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            month: month_name(date.month()).to_string(),
            year: date.year(),
            category: "Otros".into(),
            description: String::new(),
            amount_local: amount.local,
            amount_foreign: amount.foreign,
            payment_method: "Efectivo".into(),
            company_id,
            kind,
        }
    }

    pub fn amount(&self) -> DualAmount {
        DualAmount::new(self.amount_local, self.amount_foreign)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Merges every populated field of `patch` into this transaction.
    pub fn apply_patch(&mut self, patch: &TransactionPatch) {
        let TransactionPatch {
            date,
            month,
            year,
            category,
            description,
            amount_local,
            amount_foreign,
            payment_method,
            kind,
        } = patch;
        if let Some(date) = date {
            self.date = *date;
        }
        if let Some(month) = month {
            self.month = month.clone();
        }
        if let Some(year) = year {
            self.year = *year;
        }
        if let Some(category) = category {
            self.category = category.clone();
        }
        if let Some(description) = description {
            self.description = description.clone();
        }
        if let Some(amount) = amount_local {
            self.amount_local = *amount;
        }
        if let Some(amount) = amount_foreign {
            self.amount_foreign = *amount;
        }
        if let Some(method) = payment_method {
            self.payment_method = method.clone();
        }
        if let Some(kind) = kind {
            self.kind = *kind;
        }
    }
}

/// Partial update for a [`Transaction`]; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_local: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_foreign: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub kind: Option<TransactionType>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self == &TransactionPatch::default()
    }

    /// Patch that rewrites the date together with its derived month and year.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self.month = Some(month_name(date.month()).to_string());
        self.year = Some(date.year());
        self
    }
}

/// Manual-entry form payload.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount_local: f64,
    pub amount_foreign: f64,
    pub payment_method: Option<String>,
}

impl TransactionDraft {
    /// Sets the local amount and derives the foreign side from `rate`.
    pub fn set_local_amount(&mut self, amount: f64, rate: f64) {
        let entry = DualAmount::from_local_entry(amount, rate);
        self.amount_local = entry.local;
        self.amount_foreign = entry.foreign;
    }

    fn validate(&self) -> Result<NaiveDate, LedgerError> {
        let amounts = [self.amount_local, self.amount_foreign];
        if amounts.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(LedgerError::InvalidInput(
                "amounts must be non-negative numbers; the type carries the sign".into(),
            ));
        }
        if self.amount_local == 0.0 && self.amount_foreign == 0.0 {
            return Err(LedgerError::InvalidInput(
                "an amount in RD$ or US$ is required".into(),
            ));
        }
        self.date
            .ok_or_else(|| LedgerError::InvalidInput("a date is required".into()))
    }

    /// Field values shared by creation and editing.
    pub fn to_patch(&self, kind: TransactionType) -> Result<TransactionPatch, LedgerError> {
        let date = self.validate()?;
        let description = non_empty(self.description.as_deref()).unwrap_or(match kind {
            TransactionType::Income => "Ingreso Manual",
            TransactionType::Expense => "Gasto Manual",
        });
        Ok(TransactionPatch {
            category: Some(non_empty(self.category.as_deref()).unwrap_or("Otros").into()),
            description: Some(description.into()),
            amount_local: Some(self.amount_local),
            amount_foreign: Some(self.amount_foreign),
            payment_method: Some(
                non_empty(self.payment_method.as_deref())
                    .unwrap_or("Efectivo")
                    .into(),
            ),
            kind: Some(kind),
            ..TransactionPatch::default()
        }
        .with_date(date))
    }

    pub fn into_transaction(
        self,
        company_id: Uuid,
        kind: TransactionType,
    ) -> Result<Transaction, LedgerError> {
        let patch = self.to_patch(kind)?;
        let date = self.validate()?;
        let mut txn = Transaction::new(company_id, kind, date, DualAmount::ZERO);
        txn.apply_patch(&patch);
        Ok(txn)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn draft_fills_defaults_and_derives_month() {
        let mut draft = TransactionDraft {
            date: Some(date(2024, 3, 9)),
            ..TransactionDraft::default()
        };
        draft.set_local_amount(585.0, 58.5);
        let txn = draft
            .into_transaction(Uuid::new_v4(), TransactionType::Expense)
            .expect("valid draft");
        assert_eq!(txn.month, "Marzo");
        assert_eq!(txn.year, 2024);
        assert_eq!(txn.description, "Gasto Manual");
        assert_eq!(txn.category, "Otros");
        assert_eq!(txn.payment_method, "Efectivo");
        assert_eq!(txn.amount_foreign, 10.0);
    }

    #[test]
    fn draft_without_amount_is_rejected() {
        let draft = TransactionDraft {
            date: Some(date(2024, 3, 9)),
            ..TransactionDraft::default()
        };
        let err = draft
            .into_transaction(Uuid::new_v4(), TransactionType::Income)
            .expect_err("zero amounts must fail");
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn negative_or_non_finite_amounts_are_rejected() {
        for (local, foreign) in [(-500.0, 0.0), (f64::NAN, 0.0), (100.0, f64::INFINITY)] {
            let draft = TransactionDraft {
                date: Some(date(2024, 3, 9)),
                amount_local: local,
                amount_foreign: foreign,
                ..TransactionDraft::default()
            };
            assert!(
                draft.into_transaction(Uuid::new_v4(), TransactionType::Expense).is_err(),
                "({local}, {foreign}) should be rejected"
            );
        }
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut txn = Transaction::new(
            Uuid::new_v4(),
            TransactionType::Income,
            date(2024, 1, 5),
            DualAmount::new(100.0, 0.0),
        );
        txn.description = "Venta".into();
        let patch = TransactionPatch {
            amount_foreign: Some(2.5),
            ..TransactionPatch::default()
        }
        .with_date(date(2024, 7, 1));
        txn.apply_patch(&patch);
        assert_eq!(txn.description, "Venta");
        assert_eq!(txn.amount_local, 100.0);
        assert_eq!(txn.amount_foreign, 2.5);
        assert_eq!(txn.month, "Julio");
    }

    #[test]
    fn type_serializes_uppercase() {
        let json = serde_json::to_string(&TransactionType::Expense).unwrap();
        assert_eq!(json, "\"EXPENSE\"");
    }
}
