//! Cross-company overview filtered by a time period.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::aggregate::{totals, LedgerTotals};
use super::company::Company;
use super::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFilter {
    /// The seven days up to and including `today`.
    Week { today: NaiveDate },
    /// `month` is 1-based.
    Month { year: i32, month: u32 },
    Year(i32),
    All,
}

impl PeriodFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            PeriodFilter::Week { today } => date >= today - Duration::days(7) && date <= today,
            PeriodFilter::Month { year, month } => date.year() == year && date.month() == month,
            PeriodFilter::Year(year) => date.year() == year,
            PeriodFilter::All => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PeriodFilter::Week { .. } => "Semana",
            PeriodFilter::Month { .. } => "Mes",
            PeriodFilter::Year(_) => "Año",
            PeriodFilter::All => "Todo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyOverview {
    pub company_id: Uuid,
    pub name: String,
    pub totals: LedgerTotals,
}

pub fn filter_period(transactions: &[Transaction], filter: PeriodFilter) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|txn| filter.contains(txn.date))
        .collect()
}

/// One row per company, in the order companies are given.
pub fn company_breakdown(
    companies: &[Company],
    transactions: &[Transaction],
    filter: PeriodFilter,
) -> Vec<CompanyOverview> {
    let in_period = filter_period(transactions, filter);
    companies
        .iter()
        .map(|company| CompanyOverview {
            company_id: company.id,
            name: company.name.clone(),
            totals: totals(
                in_period
                    .iter()
                    .copied()
                    .filter(|txn| txn.company_id == company.id),
            ),
        })
        .collect()
}

/// Years offered by the overview selector: `current` and the five before it.
pub fn selectable_years(current: i32) -> Vec<i32> {
    (current - 5..=current).rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::DualAmount;
    use crate::ledger::transaction::TransactionType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_window_is_inclusive_of_both_ends() {
        let filter = PeriodFilter::Week {
            today: date(2024, 3, 15),
        };
        assert!(filter.contains(date(2024, 3, 8)));
        assert!(filter.contains(date(2024, 3, 15)));
        assert!(!filter.contains(date(2024, 3, 7)));
        assert!(!filter.contains(date(2024, 3, 16)));
    }

    #[test]
    fn breakdown_groups_by_company() {
        let main = Company::named("Principal");
        let side = Company::named("Secundaria");
        let data = vec![
            Transaction::new(
                main.id,
                TransactionType::Income,
                date(2024, 3, 2),
                DualAmount::new(100.0, 2.0),
            ),
            Transaction::new(
                side.id,
                TransactionType::Expense,
                date(2024, 3, 4),
                DualAmount::new(40.0, 0.0),
            ),
            Transaction::new(
                side.id,
                TransactionType::Expense,
                date(2024, 4, 4),
                DualAmount::new(99.0, 0.0),
            ),
        ];
        let rows = company_breakdown(
            &[main.clone(), side.clone()],
            &data,
            PeriodFilter::Month {
                year: 2024,
                month: 3,
            },
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].totals.income_foreign, 2.0);
        assert_eq!(rows[1].totals.expense_local, 40.0);
    }

    #[test]
    fn selectable_years_counts_down() {
        assert_eq!(selectable_years(2024), vec![2024, 2023, 2022, 2021, 2020, 2019]);
    }
}
