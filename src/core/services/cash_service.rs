use tracing::{debug, info, warn};

use crate::cash::{diff_obligations, has_changed, plan, CashPlan, CashPositionSnapshot};
use crate::core::services::ServiceResult;
use crate::core::{AppContext, Workspace};

/// Persists the quick-count snapshot.
pub struct CashService;

impl CashService {
    pub fn plan(ws: &Workspace) -> CashPlan {
        plan(&ws.snapshot)
    }

    /// Saves `next` when it differs from the stored snapshot. Weekly rows are
    /// synced by id, so unchanged rows keep their identifiers.
    ///
    /// Returns `false` when there was nothing to write. On failure the
    /// workspace goes back to the previous snapshot.
    pub fn save(
        ctx: &AppContext,
        ws: &mut Workspace,
        next: CashPositionSnapshot,
    ) -> ServiceResult<bool> {
        let unchanged = ws
            .saved_snapshot
            .as_ref()
            .map_or(false, |saved| !has_changed(saved, &next));
        if unchanged {
            ws.snapshot = next;
            debug!("snapshot unchanged; skipping write");
            return Ok(false);
        }

        let previous = std::mem::replace(&mut ws.snapshot, next.clone());
        match Self::write(ctx, ws, &next) {
            Ok(saved) => {
                ws.snapshot = saved.clone();
                ws.saved_snapshot = Some(saved);
                info!("cash snapshot saved");
                Ok(true)
            }
            Err(err) => {
                ws.snapshot = previous;
                warn!(error = %err, "cash snapshot save reverted");
                Err(err)
            }
        }
    }

    fn write(
        ctx: &AppContext,
        ws: &Workspace,
        next: &CashPositionSnapshot,
    ) -> ServiceResult<CashPositionSnapshot> {
        let store = ctx.store();
        let previous_rows = ws
            .saved_snapshot
            .as_ref()
            .map(|saved| saved.weekly_obligations.clone())
            .unwrap_or_default();
        let mut stored = store.upsert_snapshot(ws.owner, next)?;
        if let Some(snapshot_id) = stored.id {
            let diff = diff_obligations(&previous_rows, &next.weekly_obligations);
            if !diff.is_empty() {
                store.sync_weekly(ws.owner, snapshot_id, &diff)?;
            }
        }
        stored.weekly_obligations = next.weekly_obligations.clone();
        Ok(stored)
    }
}
