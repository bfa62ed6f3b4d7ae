use tracing::{info, warn};
use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::core::{AppContext, Workspace};
use crate::subscriptions::{aggregate, RecurringTotals, Subscription, SubscriptionDraft};

pub struct SubscriptionService;

impl SubscriptionService {
    pub fn add(ctx: &AppContext, ws: &mut Workspace, draft: SubscriptionDraft) -> ServiceResult<Uuid> {
        let subscription = draft.into_subscription()?;
        if ws.obligation(subscription.linked_obligation_id).is_none() {
            return Err(ServiceError::Invalid("linked card does not exist".into()));
        }
        let id = subscription.id;
        ws.subscriptions.push(subscription.clone());
        if let Err(err) = ctx.store().insert_subscription(ws.owner, &subscription) {
            ws.subscriptions.retain(|existing| existing.id != id);
            warn!(%id, error = %err, "subscription insert reverted");
            return Err(err.into());
        }
        info!(%id, name = %subscription.name, "subscription added");
        Ok(id)
    }

    pub fn remove(ctx: &AppContext, ws: &mut Workspace, id: Uuid) -> ServiceResult<Subscription> {
        let index = ws
            .subscriptions
            .iter()
            .position(|sub| sub.id == id)
            .ok_or_else(|| ServiceError::not_found("Subscription"))?;
        let removed = ws.subscriptions.remove(index);
        if let Err(err) = ctx.store().delete_subscription(ws.owner, id) {
            ws.subscriptions.insert(index, removed);
            warn!(%id, error = %err, "subscription delete reverted");
            return Err(err.into());
        }
        Ok(removed)
    }

    /// Totals at the snapshot's exchange rate.
    pub fn totals(ws: &Workspace) -> RecurringTotals {
        aggregate(&ws.subscriptions, ws.snapshot.exchange_rate)
    }
}
