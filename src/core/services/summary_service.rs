use chrono::NaiveDate;
use serde::Serialize;

use crate::cash::{plan, CashPlan};
use crate::core::Workspace;
use crate::currency::DualAmount;
use crate::debt::total_outstanding;
use crate::ledger::{company_breakdown, summarize, CompanyOverview, LedgerSummary, PeriodFilter};
use crate::subscriptions::{aggregate, RecurringTotals};

/// Read-only dashboard figures for the selected company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub ledger: LedgerSummary,
    pub outstanding_debt: DualAmount,
    pub recurring: RecurringTotals,
    pub cash: CashPlan,
}

pub struct SummaryService;

impl SummaryService {
    pub fn ledger(ws: &Workspace, year: i32) -> Option<LedgerSummary> {
        ws.selected_company
            .map(|company_id| summarize(&ws.transactions, company_id, year))
    }

    pub fn overview(ws: &Workspace, filter: PeriodFilter) -> Vec<CompanyOverview> {
        company_breakdown(&ws.companies, &ws.transactions, filter)
    }

    pub fn dashboard(ws: &Workspace, today: NaiveDate) -> Option<Dashboard> {
        use chrono::Datelike;

        Some(Dashboard {
            ledger: Self::ledger(ws, today.year())?,
            outstanding_debt: total_outstanding(&ws.obligations),
            recurring: aggregate(&ws.subscriptions, ws.snapshot.exchange_rate),
            cash: plan(&ws.snapshot),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Workspace;
    use crate::ledger::Company;
    use uuid::Uuid;

    #[test]
    fn dashboard_requires_a_selected_company() {
        let mut ws = Workspace::empty(Uuid::new_v4());
        let today = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        assert!(SummaryService::dashboard(&ws, today).is_none());

        let company = Company::seed();
        ws.selected_company = Some(company.id);
        ws.companies.push(company);
        let dashboard = SummaryService::dashboard(&ws, today).unwrap();
        assert_eq!(dashboard.ledger.monthly.len(), 12);
        assert_eq!(dashboard.outstanding_debt, DualAmount::ZERO);
        assert_eq!(SummaryService::overview(&ws, PeriodFilter::All).len(), 1);
    }
}
