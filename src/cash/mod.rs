//! Quick-count cash position: liquid balances netted against weekly obligations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::DEFAULT_EXCHANGE_RATE;

pub const DEFAULT_SOURCES: [&str; 4] = [
    "Banco Popular",
    "Banco BHD",
    "BanReservas",
    "Efectivo en Mano",
];

pub const MIN_DAYS_REMAINING: u32 = 1;
pub const MAX_DAYS_REMAINING: u32 = 31;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SettlementMode {
    #[default]
    #[serde(rename = "Completo")]
    Full,
    #[serde(rename = "Mitad")]
    Half,
}

impl SettlementMode {
    pub fn toggled(self) -> Self {
        match self {
            SettlementMode::Full => SettlementMode::Half,
            SettlementMode::Half => SettlementMode::Full,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettlementMode::Full => "Completo",
            SettlementMode::Half => "Mitad",
        }
    }
}

/// A weekly commitment in local currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyObligation {
    pub id: Uuid,
    pub concept: String,
    pub amount: f64,
    pub settlement_mode: SettlementMode,
    pub is_paid: bool,
}

impl WeeklyObligation {
    pub fn new(concept: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            concept: concept.into(),
            amount,
            settlement_mode: SettlementMode::Full,
            is_paid: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceSource {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashPositionSnapshot {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub balances: Vec<BalanceSource>,
    pub exchange_rate: f64,
    pub ad_spend_foreign: f64,
    pub days_remaining: u32,
    #[serde(default)]
    pub weekly_obligations: Vec<WeeklyObligation>,
}

impl Default for CashPositionSnapshot {
    fn default() -> Self {
        Self {
            id: None,
            balances: DEFAULT_SOURCES
                .iter()
                .map(|name| BalanceSource {
                    name: (*name).to_string(),
                    amount: 0.0,
                })
                .collect(),
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            ad_spend_foreign: 0.0,
            days_remaining: MIN_DAYS_REMAINING,
            weekly_obligations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CashPlan {
    pub total_available: f64,
    pub total_obligations: f64,
    pub shortfall: f64,
    pub daily_target: f64,
    /// Informational only; not part of available cash.
    pub ad_spend_local: f64,
}

/// Paid and unpaid obligations both count toward the week's commitment.
pub fn plan(snapshot: &CashPositionSnapshot) -> CashPlan {
    let total_available: f64 = snapshot.balances.iter().map(|source| source.amount).sum();
    let total_obligations: f64 = snapshot
        .weekly_obligations
        .iter()
        .map(|obligation| obligation.amount)
        .sum();
    let shortfall = (total_obligations - total_available).max(0.0);
    let daily_target = if snapshot.days_remaining > 0 {
        shortfall / f64::from(snapshot.days_remaining)
    } else {
        0.0
    };
    CashPlan {
        total_available,
        total_obligations,
        shortfall,
        daily_target,
        ad_spend_local: snapshot.ad_spend_foreign * snapshot.exchange_rate,
    }
}

impl CashPositionSnapshot {
    pub fn balance(&self, source: &str) -> Option<f64> {
        self.balances
            .iter()
            .find(|entry| entry.name == source)
            .map(|entry| entry.amount)
    }

    /// Updates a source in place, appending it when unknown.
    pub fn set_balance(&self, source: &str, amount: f64) -> Self {
        let mut next = self.clone();
        match next.balances.iter_mut().find(|entry| entry.name == source) {
            Some(entry) => entry.amount = amount,
            None => next.balances.push(BalanceSource {
                name: source.to_string(),
                amount,
            }),
        }
        next
    }

    pub fn set_days_remaining(&self, days: u32) -> Self {
        let mut next = self.clone();
        next.days_remaining = days.clamp(MIN_DAYS_REMAINING, MAX_DAYS_REMAINING);
        next
    }

    pub fn add_obligation(&self, obligation: WeeklyObligation) -> Self {
        let mut next = self.clone();
        next.weekly_obligations.push(obligation);
        next
    }

    pub fn remove_obligation(&self, id: Uuid) -> Self {
        let mut next = self.clone();
        next.weekly_obligations.retain(|obligation| obligation.id != id);
        next
    }

    pub fn toggle_obligation_paid(&self, id: Uuid) -> Self {
        self.map_obligation(id, |obligation| obligation.is_paid = !obligation.is_paid)
    }

    pub fn toggle_settlement_mode(&self, id: Uuid) -> Self {
        self.map_obligation(id, |obligation| {
            obligation.settlement_mode = obligation.settlement_mode.toggled()
        })
    }

    fn map_obligation<F>(&self, id: Uuid, mutate: F) -> Self
    where
        F: FnOnce(&mut WeeklyObligation),
    {
        let mut next = self.clone();
        if let Some(obligation) = next
            .weekly_obligations
            .iter_mut()
            .find(|obligation| obligation.id == id)
        {
            mutate(obligation);
        }
        next
    }
}

/// Builds a weekly obligation from form input; both fields are required and
/// the amount must be a finite number.
pub fn new_obligation(concept: &str, amount: Option<f64>) -> Option<WeeklyObligation> {
    let concept = concept.trim();
    match amount {
        Some(amount) if !concept.is_empty() && amount.is_finite() => {
            Some(WeeklyObligation::new(concept, amount))
        }
        _ => None,
    }
}

/// True when `next` differs from the last persisted snapshot.
pub fn has_changed(previous: &CashPositionSnapshot, next: &CashPositionSnapshot) -> bool {
    previous != next
}

/// Row-level changes between two weekly-obligation lists, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObligationDiff {
    pub inserted: Vec<WeeklyObligation>,
    pub updated: Vec<WeeklyObligation>,
    pub removed: Vec<Uuid>,
}

impl ObligationDiff {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Diff that undoes this one when applied to the post-image.
    pub fn inverse(&self, previous: &[WeeklyObligation]) -> ObligationDiff {
        let restored_updates = self
            .updated
            .iter()
            .filter_map(|row| previous.iter().find(|old| old.id == row.id).cloned())
            .collect();
        let restored_removed = self
            .removed
            .iter()
            .filter_map(|id| previous.iter().find(|old| old.id == *id).cloned())
            .collect();
        ObligationDiff {
            inserted: restored_removed,
            updated: restored_updates,
            removed: self.inserted.iter().map(|row| row.id).collect(),
        }
    }
}

pub fn diff_obligations(previous: &[WeeklyObligation], next: &[WeeklyObligation]) -> ObligationDiff {
    let mut diff = ObligationDiff::default();
    for row in next {
        match previous.iter().find(|old| old.id == row.id) {
            None => diff.inserted.push(row.clone()),
            Some(old) if old != row => diff.updated.push(row.clone()),
            Some(_) => {}
        }
    }
    diff.removed = previous
        .iter()
        .filter(|old| !next.iter().any(|row| row.id == old.id))
        .map(|old| old.id)
        .collect();
    diff
}

/// Applies a diff to a list, keeping the order of surviving rows.
pub fn apply_diff(rows: &mut Vec<WeeklyObligation>, diff: &ObligationDiff) {
    rows.retain(|row| !diff.removed.contains(&row.id));
    for updated in &diff.updated {
        if let Some(row) = rows.iter_mut().find(|row| row.id == updated.id) {
            *row = updated.clone();
        }
    }
    for inserted in &diff.inserted {
        if !rows.iter().any(|row| row.id == inserted.id) {
            rows.push(inserted.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortfall_spreads_over_remaining_days() {
        let snapshot = CashPositionSnapshot::default()
            .set_balance("Banco Popular", 600.0)
            .set_balance("Efectivo en Mano", 400.0)
            .add_obligation(WeeklyObligation::new("Nómina", 1000.0))
            .add_obligation(WeeklyObligation::new("Flete", 500.0))
            .set_days_remaining(5);
        let plan = plan(&snapshot);
        assert_eq!(plan.total_available, 1000.0);
        assert_eq!(plan.total_obligations, 1500.0);
        assert_eq!(plan.shortfall, 500.0);
        assert_eq!(plan.daily_target, 100.0);
    }

    #[test]
    fn paid_obligations_still_count() {
        let rent = WeeklyObligation::new("Renta", 300.0);
        let id = rent.id;
        let snapshot = CashPositionSnapshot::default()
            .add_obligation(rent)
            .toggle_obligation_paid(id);
        assert!(snapshot.weekly_obligations[0].is_paid);
        assert_eq!(plan(&snapshot).total_obligations, 300.0);
    }

    #[test]
    fn zero_days_never_divides() {
        let mut snapshot = CashPositionSnapshot::default().add_obligation(WeeklyObligation::new("x", 10.0));
        snapshot.days_remaining = 0;
        assert_eq!(plan(&snapshot).daily_target, 0.0);
        assert_eq!(snapshot.set_days_remaining(0).days_remaining, 1);
        assert_eq!(snapshot.set_days_remaining(90).days_remaining, 31);
    }

    #[test]
    fn surplus_yields_no_shortfall() {
        let snapshot = CashPositionSnapshot::default()
            .set_balance("Banco BHD", 5000.0)
            .add_obligation(WeeklyObligation::new("Luz", 100.0));
        assert_eq!(plan(&snapshot).shortfall, 0.0);
    }

    #[test]
    fn settlement_mode_toggles() {
        let row = WeeklyObligation::new("Préstamo", 800.0);
        let id = row.id;
        let snapshot = CashPositionSnapshot::default()
            .add_obligation(row)
            .toggle_settlement_mode(id);
        assert_eq!(snapshot.weekly_obligations[0].settlement_mode, SettlementMode::Half);
    }

    #[test]
    fn new_obligation_requires_concept_and_amount() {
        assert!(new_obligation("", Some(10.0)).is_none());
        assert!(new_obligation("Agua", None).is_none());
        assert!(new_obligation("Agua", Some(10.0)).is_some());
    }

    #[test]
    fn new_obligation_rejects_non_finite_amounts() {
        assert!(new_obligation("Agua", Some(f64::NAN)).is_none());
        assert!(new_obligation("Agua", Some(f64::INFINITY)).is_none());
    }

    #[test]
    fn diff_tracks_rows_by_id() {
        let keep = WeeklyObligation::new("keep", 1.0);
        let change = WeeklyObligation::new("change", 2.0);
        let drop = WeeklyObligation::new("drop", 3.0);
        let previous = vec![keep.clone(), change.clone(), drop.clone()];

        let mut changed = change.clone();
        changed.is_paid = true;
        let added = WeeklyObligation::new("added", 4.0);
        let next = vec![keep.clone(), changed.clone(), added.clone()];

        let diff = diff_obligations(&previous, &next);
        assert_eq!(diff.inserted, vec![added]);
        assert_eq!(diff.updated, vec![changed]);
        assert_eq!(diff.removed, vec![drop.id]);

        let mut rows = previous.clone();
        apply_diff(&mut rows, &diff);
        assert_eq!(rows, next);

        apply_diff(&mut rows, &diff.inverse(&previous));
        let mut ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut expected: Vec<Uuid> = previous.iter().map(|row| row.id).collect();
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn unchanged_snapshot_is_detected() {
        let snapshot = CashPositionSnapshot::default();
        assert!(!has_changed(&snapshot, &snapshot.clone()));
        assert!(has_changed(&snapshot, &snapshot.set_balance("Banco BHD", 1.0)));
    }
}
