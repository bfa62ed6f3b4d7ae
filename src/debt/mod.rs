//! Credit-card obligations: due-date derivation, urgency, and payment reconciliation.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::DualAmount;
use crate::errors::LedgerError;

pub const DEFAULT_DEBT_LABEL: &str = "Consumo";

const BHD_GRACE_DAYS: i64 = 25;
const RESERVAS_GRACE_DAYS: i64 = 22;
const DEFAULT_GRACE_DAYS: i64 = 20;

const CRITICAL_DAYS: i64 = 5;
const ATTENTION_DAYS: i64 = 12;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ObligationStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Abonada")]
    PartiallyPaid,
    #[serde(rename = "Pagada")]
    Paid,
}

impl ObligationStatus {
    pub fn label(self) -> &'static str {
        match self {
            ObligationStatus::Pending => "Pendiente",
            ObligationStatus::PartiallyPaid => "Abonada",
            ObligationStatus::Paid => "Pagada",
        }
    }
}

/// Urgency bands ordered by increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Urgency {
    Paid,
    OnTrack,
    Attention,
    Critical,
    Overdue,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Paid => "Pagada",
            Urgency::OnTrack => "A tiempo",
            Urgency::Attention => "Atención",
            Urgency::Critical => "Crítico",
            Urgency::Overdue => "Vencida",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditObligation {
    pub id: Uuid,
    pub issuer: String,
    pub label: String,
    #[serde(default)]
    pub cutoff_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub debt_local: f64,
    pub debt_foreign: f64,
    pub debt_label_local: String,
    pub debt_label_foreign: String,
    pub status: ObligationStatus,
    pub paid_local: f64,
    pub paid_foreign: f64,
}

impl CreditObligation {
    pub fn new(issuer: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            issuer: issuer.into(),
            label: label.into(),
            cutoff_date: None,
            due_date: None,
            debt_local: 0.0,
            debt_foreign: 0.0,
            debt_label_local: DEFAULT_DEBT_LABEL.into(),
            debt_label_foreign: DEFAULT_DEBT_LABEL.into(),
            status: ObligationStatus::Pending,
            paid_local: 0.0,
            paid_foreign: 0.0,
        }
    }

    pub fn with_debt(mut self, debt: DualAmount) -> Self {
        self.debt_local = debt.local;
        self.debt_foreign = debt.foreign;
        self
    }

    /// Sets the cutoff and derives the due date from it.
    pub fn with_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.cutoff_date = Some(cutoff);
        self.due_date = Some(derive_due_date(cutoff, &self.issuer));
        self
    }

    pub fn debt(&self) -> DualAmount {
        DualAmount::new(self.debt_local, self.debt_foreign)
    }

    pub fn paid(&self) -> DualAmount {
        DualAmount::new(self.paid_local, self.paid_foreign)
    }

    pub fn is_paid(&self) -> bool {
        self.status == ObligationStatus::Paid
    }

    /// Zero when no due date is set.
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        self.due_date
            .map(|due| days_until_due(due, today))
            .unwrap_or(0)
    }

    pub fn urgency(&self, today: NaiveDate) -> Urgency {
        classify_urgency(self.days_until_due(today), self.is_paid())
    }

    /// `"<issuer> - <label>"`, as shown next to linked subscriptions.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.issuer, self.label)
    }

    pub fn apply_patch(&mut self, patch: &ObligationPatch) {
        let ObligationPatch {
            issuer,
            label,
            cutoff_date,
            due_date,
            debt_local,
            debt_foreign,
            debt_label_local,
            debt_label_foreign,
            status,
            paid_local,
            paid_foreign,
        } = patch;
        if let Some(issuer) = issuer {
            self.issuer = issuer.clone();
        }
        if let Some(label) = label {
            self.label = label.clone();
        }
        if let Some(cutoff) = cutoff_date {
            self.cutoff_date = *cutoff;
        }
        if let Some(due) = due_date {
            self.due_date = *due;
        }
        if let Some(value) = debt_local {
            self.debt_local = *value;
        }
        if let Some(value) = debt_foreign {
            self.debt_foreign = *value;
        }
        if let Some(value) = debt_label_local {
            self.debt_label_local = value.clone();
        }
        if let Some(value) = debt_label_foreign {
            self.debt_label_foreign = value.clone();
        }
        if let Some(status) = status {
            self.status = *status;
        }
        if let Some(value) = paid_local {
            self.paid_local = *value;
        }
        if let Some(value) = paid_foreign {
            self.paid_foreign = *value;
        }
    }
}

/// Partial update for a [`CreditObligation`].
///
/// Date fields use a nested option so a patch can clear a date: `Some(None)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObligationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_local: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_foreign: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_label_local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_label_foreign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ObligationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_local: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_foreign: Option<f64>,
}

impl ObligationPatch {
    pub fn is_empty(&self) -> bool {
        self == &ObligationPatch::default()
    }

    /// Patch carrying the paid amounts and status of `obligation`.
    pub fn payment_of(obligation: &CreditObligation) -> Self {
        Self {
            paid_local: Some(obligation.paid_local),
            paid_foreign: Some(obligation.paid_foreign),
            status: Some(obligation.status),
            ..Self::default()
        }
    }

    /// Patch that rewrites every editable field from `obligation`.
    pub fn full(obligation: &CreditObligation) -> Self {
        Self {
            issuer: Some(obligation.issuer.clone()),
            label: Some(obligation.label.clone()),
            cutoff_date: Some(obligation.cutoff_date),
            due_date: Some(obligation.due_date),
            debt_local: Some(obligation.debt_local),
            debt_foreign: Some(obligation.debt_foreign),
            debt_label_local: Some(obligation.debt_label_local.clone()),
            debt_label_foreign: Some(obligation.debt_label_foreign.clone()),
            status: Some(obligation.status),
            paid_local: Some(obligation.paid_local),
            paid_foreign: Some(obligation.paid_foreign),
        }
    }
}

/// Grace period in days for an issuer; matching is case-insensitive and the
/// first rule that matches wins.
pub fn grace_period_days(issuer: &str) -> i64 {
    let issuer = issuer.to_lowercase();
    if issuer.contains("bhd") {
        BHD_GRACE_DAYS
    } else if issuer.contains("reservas") {
        RESERVAS_GRACE_DAYS
    } else {
        DEFAULT_GRACE_DAYS
    }
}

pub fn derive_due_date(cutoff: NaiveDate, issuer: &str) -> NaiveDate {
    cutoff + Duration::days(grace_period_days(issuer))
}

/// Calendar-day distance from `today` to `due`; negative once overdue.
pub fn days_until_due(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

pub fn classify_urgency(days_until_due: i64, is_paid: bool) -> Urgency {
    if is_paid {
        Urgency::Paid
    } else if days_until_due < 0 {
        Urgency::Overdue
    } else if days_until_due <= CRITICAL_DAYS {
        Urgency::Critical
    } else if days_until_due <= ATTENTION_DAYS {
        Urgency::Attention
    } else {
        Urgency::OnTrack
    }
}

/// Status implied by the paid amounts alone.
pub fn status_for(debt: DualAmount, paid: DualAmount) -> ObligationStatus {
    if paid.local >= debt.local && paid.foreign >= debt.foreign {
        ObligationStatus::Paid
    } else if paid.local > 0.0 || paid.foreign > 0.0 {
        ObligationStatus::PartiallyPaid
    } else {
        ObligationStatus::Pending
    }
}

/// Adds a payment to the cumulative paid amounts and recomputes the status,
/// overwriting any status set by hand.
pub fn register_payment(
    obligation: &CreditObligation,
    added_local: f64,
    added_foreign: f64,
) -> CreditObligation {
    let mut updated = obligation.clone();
    updated.paid_local += added_local;
    updated.paid_foreign += added_foreign;
    updated.status = status_for(updated.debt(), updated.paid());
    updated
}

pub fn remaining_balance(obligation: &CreditObligation) -> DualAmount {
    (obligation.debt() - obligation.paid()).clamp_non_negative()
}

/// Sum of outstanding balances across obligations.
pub fn total_outstanding(obligations: &[CreditObligation]) -> DualAmount {
    obligations
        .iter()
        .fold(DualAmount::ZERO, |acc, obligation| {
            acc + remaining_balance(obligation)
        })
}

/// Edit-form state for creating or editing an obligation.
///
/// Changing the issuer or the cutoff date re-derives the due date and discards
/// any value typed into the due date by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObligationForm {
    pub id: Option<Uuid>,
    pub issuer: String,
    pub label: String,
    pub cutoff_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub debt_local: f64,
    pub debt_foreign: f64,
    pub debt_label_local: String,
    pub debt_label_foreign: String,
    pub status: ObligationStatus,
    pub paid_local: f64,
    pub paid_foreign: f64,
}

impl ObligationForm {
    pub fn new() -> Self {
        Self {
            debt_label_local: DEFAULT_DEBT_LABEL.into(),
            debt_label_foreign: DEFAULT_DEBT_LABEL.into(),
            ..Self::default()
        }
    }

    pub fn from_obligation(obligation: &CreditObligation) -> Self {
        Self {
            id: Some(obligation.id),
            issuer: obligation.issuer.clone(),
            label: obligation.label.clone(),
            cutoff_date: obligation.cutoff_date,
            due_date: obligation.due_date,
            debt_local: obligation.debt_local,
            debt_foreign: obligation.debt_foreign,
            debt_label_local: obligation.debt_label_local.clone(),
            debt_label_foreign: obligation.debt_label_foreign.clone(),
            status: obligation.status,
            paid_local: obligation.paid_local,
            paid_foreign: obligation.paid_foreign,
        }
    }

    pub fn set_issuer(&mut self, issuer: impl Into<String>) {
        self.issuer = issuer.into();
        self.rederive_due_date();
    }

    pub fn set_cutoff_date(&mut self, cutoff: Option<NaiveDate>) {
        self.cutoff_date = cutoff;
        self.rederive_due_date();
    }

    pub fn set_due_date(&mut self, due: Option<NaiveDate>) {
        self.due_date = due;
    }

    fn rederive_due_date(&mut self) {
        if let Some(cutoff) = self.cutoff_date {
            self.due_date = Some(derive_due_date(cutoff, &self.issuer));
        }
    }

    /// Validates the form and produces the obligation to persist.
    pub fn build(&self) -> Result<CreditObligation, LedgerError> {
        let issuer = self.issuer.trim();
        let label = self.label.trim();
        if issuer.is_empty() || label.is_empty() {
            return Err(LedgerError::InvalidInput(
                "issuer and card label are required".into(),
            ));
        }
        Ok(CreditObligation {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            issuer: issuer.to_string(),
            label: label.to_string(),
            cutoff_date: self.cutoff_date,
            due_date: self.due_date,
            debt_local: self.debt_local.max(0.0),
            debt_foreign: self.debt_foreign.max(0.0),
            debt_label_local: label_or_default(&self.debt_label_local),
            debt_label_foreign: label_or_default(&self.debt_label_foreign),
            status: self.status,
            paid_local: self.paid_local.max(0.0),
            paid_foreign: self.paid_foreign.max(0.0),
        })
    }
}

fn label_or_default(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        DEFAULT_DEBT_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}
