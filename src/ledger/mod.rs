//! Transactions, ledger groups, and their aggregations.

pub mod aggregate;
pub mod company;
pub mod overview;
pub mod transaction;

pub use aggregate::{
    monthly_series, section, sorted_for_display, summarize, totals, LedgerSummary, LedgerTotals,
    MonthlyBucket,
};
pub use company::{resolve_selected, AppSettings, Company, CompanyPatch, CompanyTheme};
pub use overview::{company_breakdown, filter_period, CompanyOverview, PeriodFilter};
pub use transaction::{
    month_name, Transaction, TransactionDraft, TransactionPatch, TransactionType,
    EXPENSE_CATEGORIES, INCOME_CATEGORIES, MONTH_NAMES,
};
