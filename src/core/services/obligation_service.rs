use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::core::{AppContext, Workspace};
use crate::debt::{register_payment, CreditObligation, ObligationForm, ObligationPatch, Urgency};

/// Credit-card lifecycle: create, edit, pay, delete.
pub struct ObligationService;

impl ObligationService {
    /// Inserts a new card or rewrites an existing one from the edit form.
    pub fn save(ctx: &AppContext, ws: &mut Workspace, form: &ObligationForm) -> ServiceResult<Uuid> {
        let card = form.build()?;
        let id = card.id;
        match ws.obligations.iter().position(|existing| existing.id == id) {
            Some(index) => {
                let patch = ObligationPatch::full(&card);
                Self::apply(ctx, ws, index, card, &patch)?;
                info!(%id, "card updated");
            }
            None => {
                ws.obligations.push(card.clone());
                if let Err(err) = ctx.store().insert_obligation(ws.owner, &card) {
                    ws.obligations.retain(|existing| existing.id != id);
                    warn!(%id, error = %err, "card insert reverted");
                    return Err(err.into());
                }
                info!(%id, issuer = %card.issuer, "card added");
            }
        }
        Ok(id)
    }

    /// Adds a payment and persists the new paid amounts and status.
    pub fn register_payment(
        ctx: &AppContext,
        ws: &mut Workspace,
        id: Uuid,
        added_local: f64,
        added_foreign: f64,
    ) -> ServiceResult<CreditObligation> {
        let valid = |value: f64| value.is_finite() && value >= 0.0;
        if !valid(added_local) || !valid(added_foreign) {
            return Err(ServiceError::Invalid(
                "payments must be non-negative numbers".into(),
            ));
        }
        let index = Self::index_of(ws, id)?;
        let updated = register_payment(&ws.obligations[index], added_local, added_foreign);
        let patch = ObligationPatch::payment_of(&updated);
        Self::apply(ctx, ws, index, updated.clone(), &patch)?;
        info!(%id, status = updated.status.label(), "payment registered");
        Ok(updated)
    }

    pub fn remove(ctx: &AppContext, ws: &mut Workspace, id: Uuid) -> ServiceResult<CreditObligation> {
        let index = Self::index_of(ws, id)?;
        let removed = ws.obligations.remove(index);
        if let Err(err) = ctx.store().delete_obligation(ws.owner, id) {
            ws.obligations.insert(index, removed);
            warn!(%id, error = %err, "card delete reverted");
            return Err(err.into());
        }
        Ok(removed)
    }

    /// Cards paired with their urgency, most pressing first.
    pub fn by_urgency(ws: &Workspace, today: NaiveDate) -> Vec<(&CreditObligation, Urgency)> {
        let mut cards: Vec<(&CreditObligation, Urgency)> = ws
            .obligations
            .iter()
            .map(|card| (card, card.urgency(today)))
            .collect();
        cards.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.due_date.cmp(&b.0.due_date)));
        cards
    }

    fn index_of(ws: &Workspace, id: Uuid) -> ServiceResult<usize> {
        ws.obligations
            .iter()
            .position(|card| card.id == id)
            .ok_or_else(|| ServiceError::not_found("Card"))
    }

    fn apply(
        ctx: &AppContext,
        ws: &mut Workspace,
        index: usize,
        next: CreditObligation,
        patch: &ObligationPatch,
    ) -> ServiceResult<()> {
        let id = next.id;
        let previous = std::mem::replace(&mut ws.obligations[index], next);
        if let Err(err) = ctx.store().update_obligation(ws.owner, id, patch) {
            ws.obligations[index] = previous;
            warn!(%id, error = %err, "card update reverted");
            return Err(err.into());
        }
        Ok(())
    }
}
