//! Period totals, net balances, and the yearly monthly series.

use chrono::Datelike;
use serde::Serialize;
use uuid::Uuid;

use super::transaction::{Transaction, TransactionType};
use crate::currency::DualAmount;

pub const SHORT_MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LedgerTotals {
    pub income_local: f64,
    pub income_foreign: f64,
    pub expense_local: f64,
    pub expense_foreign: f64,
    pub net_local: f64,
    pub net_foreign: f64,
}

impl LedgerTotals {
    pub fn income(&self) -> DualAmount {
        DualAmount::new(self.income_local, self.income_foreign)
    }

    pub fn expense(&self) -> DualAmount {
        DualAmount::new(self.expense_local, self.expense_foreign)
    }

    pub fn net(&self) -> DualAmount {
        DualAmount::new(self.net_local, self.net_foreign)
    }

    fn record(&mut self, txn: &Transaction) {
        match txn.kind {
            TransactionType::Income => {
                self.income_local += txn.amount_local;
                self.income_foreign += txn.amount_foreign;
            }
            TransactionType::Expense => {
                self.expense_local += txn.amount_local;
                self.expense_foreign += txn.amount_foreign;
            }
        }
    }

    fn finish(mut self) -> Self {
        self.net_local = self.income_local - self.expense_local;
        self.net_foreign = self.income_foreign - self.expense_foreign;
        self
    }
}

/// One calendar month of local-currency activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub label: &'static str,
    pub index: usize,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub totals: LedgerTotals,
    pub monthly: Vec<MonthlyBucket>,
}

/// Totals for any transaction iterator, without group filtering.
pub fn totals<'a, I>(transactions: I) -> LedgerTotals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .fold(LedgerTotals::default(), |mut acc, txn| {
            acc.record(txn);
            acc
        })
        .finish()
}

/// Twelve buckets (January..December) for transactions recorded in `year`.
pub fn monthly_series<'a, I>(transactions: I, year: i32) -> Vec<MonthlyBucket>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut buckets: Vec<MonthlyBucket> = SHORT_MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(index, label)| MonthlyBucket {
            label: *label,
            index,
            income: 0.0,
            expense: 0.0,
        })
        .collect();
    for txn in transactions.into_iter().filter(|txn| txn.year == year) {
        let bucket = &mut buckets[txn.date.month0() as usize];
        match txn.kind {
            TransactionType::Income => bucket.income += txn.amount_local,
            TransactionType::Expense => bucket.expense += txn.amount_local,
        }
    }
    buckets
}

/// Dashboard view for one ledger group.
pub fn summarize(transactions: &[Transaction], company_id: Uuid, year: i32) -> LedgerSummary {
    let scoped = || transactions.iter().filter(move |txn| txn.company_id == company_id);
    LedgerSummary {
        totals: totals(scoped()),
        monthly: monthly_series(scoped(), year),
    }
}

/// Most-recent date first; equal dates keep their input order.
pub fn sorted_for_display(transactions: &[Transaction], company_id: Uuid) -> Vec<&Transaction> {
    let mut scoped: Vec<&Transaction> = transactions
        .iter()
        .filter(|txn| txn.company_id == company_id)
        .collect();
    scoped.sort_by(|a, b| b.date.cmp(&a.date));
    scoped
}

/// Income or expense side of an already ordered list.
pub fn section<'a>(transactions: &[&'a Transaction], kind: TransactionType) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .copied()
        .filter(|txn| txn.kind == kind)
        .collect()
}
