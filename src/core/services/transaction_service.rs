//! Business logic helpers for managing transactions.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::core::{AppContext, Workspace};
use crate::ledger::{sorted_for_display, Transaction, TransactionDraft, TransactionPatch, TransactionType};
use crate::tabular::write_xlsx;

/// Outcome of a chunked delete; every chunk is attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchDeleteReport {
    pub requested: usize,
    pub deleted: usize,
    pub failed_ids: Vec<Uuid>,
    pub errors: Vec<String>,
}

impl BatchDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed_ids.is_empty()
    }

    /// One notice for the whole batch, or `None` when nothing failed.
    pub fn notice(&self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        Some(format!(
            "{} de {} transacciones no se pudieron eliminar: {}",
            self.failed_ids.len(),
            self.requested,
            self.errors.join("; ")
        ))
    }
}

/// Provides validated CRUD helpers for ledger transactions.
///
/// Each mutation lands in the workspace first and is undone there when the
/// store write fails.
pub struct TransactionService;

impl TransactionService {
    /// Records a manual entry for the selected company and returns its identifier.
    pub fn add(
        ctx: &AppContext,
        ws: &mut Workspace,
        draft: TransactionDraft,
        kind: TransactionType,
    ) -> ServiceResult<Uuid> {
        let company_id = ws
            .selected_company
            .ok_or_else(|| ServiceError::Invalid("select a company first".into()))?;
        let txn = draft.into_transaction(company_id, kind)?;
        let id = txn.id;
        ws.transactions.push(txn.clone());
        if let Err(err) = ctx.store().insert_transaction(ws.owner, &txn) {
            ws.transactions.retain(|existing| existing.id != id);
            warn!(%id, error = %err, "transaction insert reverted");
            return Err(err.into());
        }
        info!(%id, kind = kind.label(), "transaction added");
        Ok(id)
    }

    /// Appends imported rows in one store call.
    pub fn add_many(
        ctx: &AppContext,
        ws: &mut Workspace,
        rows: Vec<Transaction>,
    ) -> ServiceResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let ids: HashSet<Uuid> = rows.iter().map(|txn| txn.id).collect();
        ws.transactions.extend(rows.iter().cloned());
        match ctx.store().insert_transactions(ws.owner, &rows) {
            Ok(saved) => {
                info!(count = saved.len(), "transactions added");
                Ok(saved.len())
            }
            Err(err) => {
                ws.transactions.retain(|txn| !ids.contains(&txn.id));
                warn!(count = rows.len(), error = %err, "bulk insert reverted");
                Err(err.into())
            }
        }
    }

    pub fn update(
        ctx: &AppContext,
        ws: &mut Workspace,
        id: Uuid,
        patch: &TransactionPatch,
    ) -> ServiceResult<()> {
        let index = ws
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or_else(|| ServiceError::not_found("Transaction"))?;
        let previous = ws.transactions[index].clone();
        ws.transactions[index].apply_patch(patch);
        if let Err(err) = ctx.store().update_transaction(ws.owner, id, patch) {
            ws.transactions[index] = previous;
            warn!(%id, error = %err, "transaction update reverted");
            return Err(err.into());
        }
        Ok(())
    }

    /// Removes the transaction identified by `id`, returning the removed instance.
    pub fn remove(ctx: &AppContext, ws: &mut Workspace, id: Uuid) -> ServiceResult<Transaction> {
        let index = ws
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or_else(|| ServiceError::not_found("Transaction"))?;
        let removed = ws.transactions.remove(index);
        if let Err(err) = ctx.store().delete_transaction(ws.owner, id) {
            ws.transactions.insert(index, removed);
            warn!(%id, error = %err, "transaction delete reverted");
            return Err(err.into());
        }
        Ok(removed)
    }

    /// Deletes `ids` in chunks of the configured batch size. A failing chunk
    /// leaves its rows in place and does not stop the remaining chunks.
    pub fn remove_many(
        ctx: &AppContext,
        ws: &mut Workspace,
        ids: &[Uuid],
    ) -> ServiceResult<BatchDeleteReport> {
        let mut report = BatchDeleteReport {
            requested: ids.len(),
            ..BatchDeleteReport::default()
        };
        let before = ws.transactions.clone();
        let mut deleted: HashSet<Uuid> = HashSet::new();
        let targets: HashSet<Uuid> = ids.iter().copied().collect();
        ws.transactions.retain(|txn| !targets.contains(&txn.id));

        for (index, chunk) in ids.chunks(ctx.delete_batch_size()).enumerate() {
            match ctx.store().delete_transactions(ws.owner, chunk) {
                Ok(_) => deleted.extend(chunk.iter().copied()),
                Err(err) => {
                    warn!(chunk = index, size = chunk.len(), error = %err, "batch delete chunk failed");
                    report.failed_ids.extend_from_slice(chunk);
                    report.errors.push(err.to_string());
                }
            }
        }

        ws.transactions = before
            .into_iter()
            .filter(|txn| !deleted.contains(&txn.id))
            .collect();
        report.deleted = deleted.len();
        info!(
            requested = report.requested,
            deleted = report.deleted,
            failed = report.failed_ids.len(),
            "batch delete finished"
        );
        Ok(report)
    }

    /// Writes every transaction of the owner, whatever its company, to an
    /// `xlsx` file. Rows keep their `Empresa ID` column.
    pub fn export(ws: &Workspace, path: &Path) -> ServiceResult<usize> {
        write_xlsx(&ws.transactions, path)?;
        Ok(ws.transactions.len())
    }

    /// Selected company's transactions, newest first.
    pub fn list(ws: &Workspace) -> Vec<&Transaction> {
        match ws.selected_company {
            Some(company_id) => sorted_for_display(&ws.transactions, company_id),
            None => Vec::new(),
        }
    }
}
