use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreOp, StoreResult};
use crate::cash::{apply_diff, CashPositionSnapshot, ObligationDiff, WeeklyObligation};
use crate::clients::{Client, ClientTask, TaskStatus};
use crate::debt::{CreditObligation, ObligationPatch};
use crate::ledger::{AppSettings, Company, CompanyPatch, Transaction, TransactionPatch};
use crate::subscriptions::Subscription;

/// Where committed table state goes after each mutation.
pub trait Persistence: Send + Sync {
    fn persist(&self, state: &StoreState) -> StoreResult<()>;
}

/// Every table belonging to one owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OwnerTables {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub obligations: Vec<CreditObligation>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub snapshot: Option<CashPositionSnapshot>,
    #[serde(default)]
    pub weekly: Vec<WeeklyObligation>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub settings: Option<AppSettings>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub tasks: Vec<ClientTask>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreState {
    #[serde(default)]
    pub owners: BTreeMap<Uuid, OwnerTables>,
}

/// Mutex-guarded table set shared by the in-memory and file-backed stores.
pub struct TableStore<P> {
    state: Mutex<StoreState>,
    armed: Mutex<HashMap<StoreOp, usize>>,
    persistence: P,
}

impl<P: Persistence> TableStore<P> {
    pub fn with_state(state: StoreState, persistence: P) -> Self {
        Self {
            state: Mutex::new(state),
            armed: Mutex::new(HashMap::new()),
            persistence,
        }
    }

    /// Makes the next `times` calls of `op` fail with [`StoreError::Rejected`].
    pub fn arm_failure(&self, op: StoreOp, times: usize) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.insert(op, times);
        }
    }

    /// Copy of the committed state.
    pub fn snapshot_state(&self) -> StoreResult<StoreState> {
        Ok(self.lock_state()?.clone())
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    fn lock_state(&self) -> StoreResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Rejected("store state lock poisoned".into()))
    }

    fn trip_armed(&self, op: StoreOp) -> StoreResult<()> {
        let mut armed = self
            .armed
            .lock()
            .map_err(|_| StoreError::Rejected("failure table lock poisoned".into()))?;
        if let Some(remaining) = armed.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                warn!(?op, "simulated store failure");
                return Err(StoreError::Rejected(format!("simulated failure on {op:?}")));
            }
        }
        Ok(())
    }

    fn read<T, F>(&self, owner: Uuid, f: F) -> StoreResult<T>
    where
        F: FnOnce(&OwnerTables) -> T,
    {
        let state = self.lock_state()?;
        let empty = OwnerTables::default();
        Ok(f(state.owners.get(&owner).unwrap_or(&empty)))
    }

    /// Runs `f` on the owner's tables and persists; the previous state is
    /// restored when either step fails.
    fn write<T, F>(&self, op: StoreOp, owner: Uuid, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut OwnerTables) -> StoreResult<T>,
    {
        self.trip_armed(op)?;
        let mut state = self.lock_state()?;
        let before = state.clone();
        let result = match f(state.owners.entry(owner).or_default()) {
            Ok(value) => value,
            Err(err) => {
                *state = before;
                return Err(err);
            }
        };
        if let Err(err) = self.persistence.persist(&state) {
            *state = before;
            return Err(err);
        }
        debug!(?op, %owner, "store write committed");
        Ok(result)
    }
}

fn not_found(table: &'static str, id: Uuid) -> StoreError {
    StoreError::NotFound { table, id }
}

fn check_snapshot(tables: &OwnerTables, snapshot_id: Uuid) -> StoreResult<()> {
    match tables.snapshot.as_ref().and_then(|snapshot| snapshot.id) {
        Some(id) if id == snapshot_id => Ok(()),
        _ => Err(not_found("cash_snapshots", snapshot_id)),
    }
}

impl<P: Persistence> RecordStore for TableStore<P> {
    fn list_transactions(&self, owner: Uuid) -> StoreResult<Vec<Transaction>> {
        self.read(owner, |tables| tables.transactions.clone())
    }

    fn insert_transactions(
        &self,
        owner: Uuid,
        rows: &[Transaction],
    ) -> StoreResult<Vec<Transaction>> {
        self.write(StoreOp::InsertTransactions, owner, |tables| {
            tables.transactions.extend(rows.iter().cloned());
            Ok(rows.to_vec())
        })
    }

    fn update_transaction(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &TransactionPatch,
    ) -> StoreResult<Transaction> {
        self.write(StoreOp::UpdateTransaction, owner, |tables| {
            let row = tables
                .transactions
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or_else(|| not_found("transactions", id))?;
            row.apply_patch(patch);
            Ok(row.clone())
        })
    }

    fn delete_transactions(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<usize> {
        self.write(StoreOp::DeleteTransactions, owner, |tables| {
            let before = tables.transactions.len();
            tables.transactions.retain(|row| !ids.contains(&row.id));
            Ok(before - tables.transactions.len())
        })
    }

    fn list_obligations(&self, owner: Uuid) -> StoreResult<Vec<CreditObligation>> {
        self.read(owner, |tables| tables.obligations.clone())
    }

    fn insert_obligation(
        &self,
        owner: Uuid,
        row: &CreditObligation,
    ) -> StoreResult<CreditObligation> {
        self.write(StoreOp::InsertObligation, owner, |tables| {
            tables.obligations.push(row.clone());
            Ok(row.clone())
        })
    }

    fn update_obligation(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &ObligationPatch,
    ) -> StoreResult<CreditObligation> {
        self.write(StoreOp::UpdateObligation, owner, |tables| {
            let row = tables
                .obligations
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or_else(|| not_found("credit_cards", id))?;
            row.apply_patch(patch);
            Ok(row.clone())
        })
    }

    fn delete_obligation(&self, owner: Uuid, id: Uuid) -> StoreResult<()> {
        self.write(StoreOp::DeleteObligation, owner, |tables| {
            let before = tables.obligations.len();
            tables.obligations.retain(|row| row.id != id);
            if tables.obligations.len() == before {
                return Err(not_found("credit_cards", id));
            }
            Ok(())
        })
    }

    fn list_subscriptions(&self, owner: Uuid) -> StoreResult<Vec<Subscription>> {
        self.read(owner, |tables| tables.subscriptions.clone())
    }

    fn insert_subscription(&self, owner: Uuid, row: &Subscription) -> StoreResult<Subscription> {
        self.write(StoreOp::InsertSubscription, owner, |tables| {
            tables.subscriptions.push(row.clone());
            Ok(row.clone())
        })
    }

    fn delete_subscription(&self, owner: Uuid, id: Uuid) -> StoreResult<()> {
        self.write(StoreOp::DeleteSubscription, owner, |tables| {
            let before = tables.subscriptions.len();
            tables.subscriptions.retain(|row| row.id != id);
            if tables.subscriptions.len() == before {
                return Err(not_found("subscriptions", id));
            }
            Ok(())
        })
    }

    fn get_snapshot(&self, owner: Uuid) -> StoreResult<Option<CashPositionSnapshot>> {
        self.read(owner, |tables| tables.snapshot.clone())
    }

    fn upsert_snapshot(
        &self,
        owner: Uuid,
        snapshot: &CashPositionSnapshot,
    ) -> StoreResult<CashPositionSnapshot> {
        self.write(StoreOp::UpsertSnapshot, owner, |tables| {
            let existing_id = tables.snapshot.as_ref().and_then(|current| current.id);
            let mut stored = snapshot.clone();
            stored.id = snapshot.id.or(existing_id).or_else(|| Some(Uuid::new_v4()));
            stored.weekly_obligations.clear();
            tables.snapshot = Some(stored.clone());
            Ok(stored)
        })
    }

    fn list_weekly(&self, owner: Uuid, snapshot_id: Uuid) -> StoreResult<Vec<WeeklyObligation>> {
        self.read(owner, |tables| {
            check_snapshot(tables, snapshot_id).map(|_| tables.weekly.clone())
        })?
    }

    fn replace_weekly(
        &self,
        owner: Uuid,
        snapshot_id: Uuid,
        rows: &[WeeklyObligation],
    ) -> StoreResult<()> {
        self.write(StoreOp::WriteWeekly, owner, |tables| {
            check_snapshot(tables, snapshot_id)?;
            tables.weekly = rows.to_vec();
            Ok(())
        })
    }

    fn sync_weekly(
        &self,
        owner: Uuid,
        snapshot_id: Uuid,
        diff: &ObligationDiff,
    ) -> StoreResult<()> {
        self.write(StoreOp::WriteWeekly, owner, |tables| {
            check_snapshot(tables, snapshot_id)?;
            if let Some(missing) = diff
                .updated
                .iter()
                .find(|row| !tables.weekly.iter().any(|stored| stored.id == row.id))
            {
                return Err(not_found("weekly_obligations", missing.id));
            }
            apply_diff(&mut tables.weekly, diff);
            Ok(())
        })
    }

    fn list_companies(&self, owner: Uuid) -> StoreResult<Vec<Company>> {
        self.read(owner, |tables| tables.companies.clone())
    }

    fn insert_company(&self, owner: Uuid, row: &Company) -> StoreResult<Company> {
        self.write(StoreOp::InsertCompany, owner, |tables| {
            tables.companies.push(row.clone());
            Ok(row.clone())
        })
    }

    fn update_company(&self, owner: Uuid, id: Uuid, patch: &CompanyPatch) -> StoreResult<Company> {
        self.write(StoreOp::UpdateCompany, owner, |tables| {
            let row = tables
                .companies
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or_else(|| not_found("companies", id))?;
            row.apply_patch(patch);
            Ok(row.clone())
        })
    }

    fn get_settings(&self, owner: Uuid) -> StoreResult<Option<AppSettings>> {
        self.read(owner, |tables| tables.settings.clone())
    }

    fn upsert_settings(&self, owner: Uuid, settings: &AppSettings) -> StoreResult<AppSettings> {
        self.write(StoreOp::UpsertSettings, owner, |tables| {
            tables.settings = Some(settings.clone());
            Ok(settings.clone())
        })
    }

    fn list_clients(&self, owner: Uuid) -> StoreResult<Vec<Client>> {
        self.read(owner, |tables| tables.clients.clone())
    }

    fn insert_client(&self, owner: Uuid, row: &Client) -> StoreResult<Client> {
        self.write(StoreOp::InsertClient, owner, |tables| {
            tables.clients.push(row.clone());
            Ok(row.clone())
        })
    }

    fn delete_client(&self, owner: Uuid, id: Uuid) -> StoreResult<()> {
        self.write(StoreOp::DeleteClient, owner, |tables| {
            let before = tables.clients.len();
            tables.clients.retain(|row| row.id != id);
            if tables.clients.len() == before {
                return Err(not_found("clients", id));
            }
            Ok(())
        })
    }

    fn list_tasks(&self, owner: Uuid) -> StoreResult<Vec<ClientTask>> {
        self.read(owner, |tables| tables.tasks.clone())
    }

    fn insert_task(&self, owner: Uuid, row: &ClientTask) -> StoreResult<ClientTask> {
        self.write(StoreOp::InsertTask, owner, |tables| {
            tables.tasks.push(row.clone());
            Ok(row.clone())
        })
    }

    fn update_task_status(
        &self,
        owner: Uuid,
        id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<ClientTask> {
        self.write(StoreOp::UpdateTask, owner, |tables| {
            let row = tables
                .tasks
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or_else(|| not_found("client_tasks", id))?;
            row.status = status;
            Ok(row.clone())
        })
    }

    fn delete_tasks_for_client(&self, owner: Uuid, client_id: Uuid) -> StoreResult<usize> {
        self.write(StoreOp::DeleteTasks, owner, |tables| {
            let before = tables.tasks.len();
            tables.tasks.retain(|row| row.client_id != client_id);
            Ok(before - tables.tasks.len())
        })
    }
}
