//! Record-store collaborator: per-table CRUD scoped to an owner.

pub mod json_backend;
pub mod memory;
pub mod tables;

use thiserror::Error;
use uuid::Uuid;

use crate::cash::{CashPositionSnapshot, ObligationDiff, WeeklyObligation};
use crate::clients::{Client, ClientTask, TaskStatus};
use crate::debt::{CreditObligation, ObligationPatch};
use crate::ledger::{AppSettings, Company, CompanyPatch, Transaction, TransactionPatch};
use crate::subscriptions::Subscription;

pub use json_backend::{JsonFile, JsonStore};
pub use memory::{MemoryStore, Volatile};
pub use tables::{Persistence, StoreState, TableStore};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} record `{id}` not found")]
    NotFound { table: &'static str, id: Uuid },
    #[error("the store rejected the request: {0}")]
    Rejected(String),
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Mutating operations, used to arm simulated failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertTransactions,
    UpdateTransaction,
    DeleteTransactions,
    InsertObligation,
    UpdateObligation,
    DeleteObligation,
    InsertSubscription,
    DeleteSubscription,
    UpsertSnapshot,
    WriteWeekly,
    InsertCompany,
    UpdateCompany,
    UpsertSettings,
    InsertClient,
    DeleteClient,
    InsertTask,
    UpdateTask,
    DeleteTasks,
}

/// Table API consumed by the services.
///
/// Every call is scoped to `owner`; a record never leaks across owners.
pub trait RecordStore: Send + Sync {
    fn list_transactions(&self, owner: Uuid) -> StoreResult<Vec<Transaction>>;
    fn insert_transactions(&self, owner: Uuid, rows: &[Transaction])
        -> StoreResult<Vec<Transaction>>;
    fn update_transaction(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &TransactionPatch,
    ) -> StoreResult<Transaction>;
    /// Deletes every listed id; unknown ids are ignored. Returns the count removed.
    fn delete_transactions(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<usize>;

    fn insert_transaction(&self, owner: Uuid, row: &Transaction) -> StoreResult<Transaction> {
        self.insert_transactions(owner, std::slice::from_ref(row))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected("insert returned no rows".into()))
    }

    fn delete_transaction(&self, owner: Uuid, id: Uuid) -> StoreResult<()> {
        match self.delete_transactions(owner, &[id])? {
            0 => Err(StoreError::NotFound {
                table: "transactions",
                id,
            }),
            _ => Ok(()),
        }
    }

    fn list_obligations(&self, owner: Uuid) -> StoreResult<Vec<CreditObligation>>;
    fn insert_obligation(&self, owner: Uuid, row: &CreditObligation)
        -> StoreResult<CreditObligation>;
    fn update_obligation(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &ObligationPatch,
    ) -> StoreResult<CreditObligation>;
    fn delete_obligation(&self, owner: Uuid, id: Uuid) -> StoreResult<()>;

    fn list_subscriptions(&self, owner: Uuid) -> StoreResult<Vec<Subscription>>;
    fn insert_subscription(&self, owner: Uuid, row: &Subscription) -> StoreResult<Subscription>;
    fn delete_subscription(&self, owner: Uuid, id: Uuid) -> StoreResult<()>;

    /// The owner's snapshot without its weekly rows.
    fn get_snapshot(&self, owner: Uuid) -> StoreResult<Option<CashPositionSnapshot>>;
    /// Creates or replaces the snapshot fields, assigning an id on first write.
    fn upsert_snapshot(
        &self,
        owner: Uuid,
        snapshot: &CashPositionSnapshot,
    ) -> StoreResult<CashPositionSnapshot>;
    fn list_weekly(&self, owner: Uuid, snapshot_id: Uuid) -> StoreResult<Vec<WeeklyObligation>>;
    /// Deletes every weekly row and inserts `rows`.
    fn replace_weekly(
        &self,
        owner: Uuid,
        snapshot_id: Uuid,
        rows: &[WeeklyObligation],
    ) -> StoreResult<()>;
    /// Applies an id-keyed diff to the weekly rows.
    fn sync_weekly(&self, owner: Uuid, snapshot_id: Uuid, diff: &ObligationDiff)
        -> StoreResult<()>;

    fn list_companies(&self, owner: Uuid) -> StoreResult<Vec<Company>>;
    fn insert_company(&self, owner: Uuid, row: &Company) -> StoreResult<Company>;
    fn update_company(&self, owner: Uuid, id: Uuid, patch: &CompanyPatch)
        -> StoreResult<Company>;

    fn get_settings(&self, owner: Uuid) -> StoreResult<Option<AppSettings>>;
    fn upsert_settings(&self, owner: Uuid, settings: &AppSettings) -> StoreResult<AppSettings>;

    fn list_clients(&self, owner: Uuid) -> StoreResult<Vec<Client>>;
    fn insert_client(&self, owner: Uuid, row: &Client) -> StoreResult<Client>;
    fn delete_client(&self, owner: Uuid, id: Uuid) -> StoreResult<()>;
    fn list_tasks(&self, owner: Uuid) -> StoreResult<Vec<ClientTask>>;
    fn insert_task(&self, owner: Uuid, row: &ClientTask) -> StoreResult<ClientTask>;
    fn update_task_status(&self, owner: Uuid, id: Uuid, status: TaskStatus)
        -> StoreResult<ClientTask>;
    fn delete_tasks_for_client(&self, owner: Uuid, client_id: Uuid) -> StoreResult<usize>;
}
