use uuid::Uuid;

use crate::cash::CashPositionSnapshot;
use crate::clients::{Client, ClientTask};
use crate::debt::CreditObligation;
use crate::ledger::{AppSettings, Company, Transaction};
use crate::subscriptions::Subscription;

/// Local copy of one owner's records, the state every view is derived from.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub owner: Uuid,
    pub transactions: Vec<Transaction>,
    pub obligations: Vec<CreditObligation>,
    pub subscriptions: Vec<Subscription>,
    /// Snapshot being edited.
    pub snapshot: CashPositionSnapshot,
    /// Snapshot as last written to the store; `None` before the first save.
    pub saved_snapshot: Option<CashPositionSnapshot>,
    pub companies: Vec<Company>,
    pub selected_company: Option<Uuid>,
    pub settings: AppSettings,
    pub clients: Vec<Client>,
    pub tasks: Vec<ClientTask>,
}

impl Workspace {
    pub fn empty(owner: Uuid) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    pub fn selected_company(&self) -> Option<&Company> {
        let id = self.selected_company?;
        self.companies.iter().find(|company| company.id == id)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn obligation(&self, id: Uuid) -> Option<&CreditObligation> {
        self.obligations.iter().find(|card| card.id == id)
    }
}
