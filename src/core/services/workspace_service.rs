use tracing::info;

use crate::cash::CashPositionSnapshot;
use crate::core::services::ServiceResult;
use crate::core::{AppContext, Workspace};
use crate::ledger::{resolve_selected, Company};

/// Pulls an owner's tables into a fresh [`Workspace`].
pub struct WorkspaceService;

impl WorkspaceService {
    /// Loads every table for the signed-in owner, seeding a first company when
    /// the owner has none.
    pub fn load(ctx: &AppContext) -> ServiceResult<Workspace> {
        let owner = ctx.owner()?;
        let store = ctx.store();
        let mut ws = Workspace::empty(owner);

        ws.transactions = store.list_transactions(owner)?;
        ws.obligations = store.list_obligations(owner)?;
        ws.subscriptions = store.list_subscriptions(owner)?;
        ws.clients = store.list_clients(owner)?;
        ws.tasks = store.list_tasks(owner)?;
        ws.settings = store.get_settings(owner)?.unwrap_or_default();

        ws.companies = store.list_companies(owner)?;
        if ws.companies.is_empty() {
            let seeded = store.insert_company(owner, &Company::seed())?;
            info!(company = %seeded.id, "seeded default company");
            ws.companies.push(seeded);
        }
        ws.selected_company = resolve_selected(&ws.companies, ctx.config().selected_company);

        if let Some(mut snapshot) = store.get_snapshot(owner)? {
            if let Some(snapshot_id) = snapshot.id {
                snapshot.weekly_obligations = store.list_weekly(owner, snapshot_id)?;
            }
            ws.snapshot = snapshot.clone();
            ws.saved_snapshot = Some(snapshot);
        } else {
            ws.snapshot = CashPositionSnapshot {
                exchange_rate: ctx.exchange_rate(),
                ..CashPositionSnapshot::default()
            };
        }

        info!(
            %owner,
            transactions = ws.transactions.len(),
            cards = ws.obligations.len(),
            subscriptions = ws.subscriptions.len(),
            "workspace loaded"
        );
        Ok(ws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn first_load_seeds_one_company() {
        let ctx = AppContext::in_memory(Config::default());
        let ws = WorkspaceService::load(&ctx).unwrap();
        assert_eq!(ws.companies.len(), 1);
        assert_eq!(ws.selected_company(), ws.companies.first());

        let again = WorkspaceService::load(&ctx).unwrap();
        assert_eq!(again.companies.len(), 1);
        assert_eq!(again.settings.app_name, "FinCommand");
        assert_eq!(again.snapshot.exchange_rate, 58.5);
        assert!(again.saved_snapshot.is_none());
    }
}
