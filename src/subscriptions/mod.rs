//! Recurring charges and their per-currency totals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::Currency;
use crate::debt::CreditObligation;
use crate::errors::LedgerError;

pub const UNKNOWN_CARD_LABEL: &str = "Tarjeta desconocida";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SubscriptionCategory {
    #[default]
    #[serde(rename = "Importante")]
    Essential,
    #[serde(rename = "Lujo")]
    Luxury,
}

impl SubscriptionCategory {
    pub fn label(self) -> &'static str {
        match self {
            SubscriptionCategory::Essential => "Importante",
            SubscriptionCategory::Luxury => "Lujo",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "importante" | "essential" => Some(SubscriptionCategory::Essential),
            "lujo" | "luxury" => Some(SubscriptionCategory::Luxury),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub currency: Currency,
    pub billing_day: u32,
    pub linked_obligation_id: Uuid,
    pub category: SubscriptionCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RecurringTotals {
    pub total_local: f64,
    pub total_foreign: f64,
    pub total_normalized_to_local: f64,
}

/// Sums amounts per currency; rounding is left to the caller.
pub fn aggregate(subscriptions: &[Subscription], exchange_rate: f64) -> RecurringTotals {
    let (total_local, total_foreign) =
        subscriptions
            .iter()
            .fold((0.0, 0.0), |(local, foreign), sub| match sub.currency {
                Currency::Local => (local + sub.amount, foreign),
                Currency::Foreign => (local, foreign + sub.amount),
            });
    RecurringTotals {
        total_local,
        total_foreign,
        total_normalized_to_local: total_local + total_foreign * exchange_rate,
    }
}

/// Card label for a subscription's linked obligation.
pub fn linked_obligation_label(subscription: &Subscription, obligations: &[CreditObligation]) -> String {
    obligations
        .iter()
        .find(|obligation| obligation.id == subscription.linked_obligation_id)
        .map(CreditObligation::display_name)
        .unwrap_or_else(|| UNKNOWN_CARD_LABEL.to_string())
}

/// Creation form payload.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionDraft {
    pub name: String,
    pub amount: f64,
    pub currency: Currency,
    pub billing_day: Option<u32>,
    pub linked_obligation_id: Option<Uuid>,
    pub category: SubscriptionCategory,
}

impl SubscriptionDraft {
    pub fn into_subscription(self) -> Result<Subscription, LedgerError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput("subscription name is required".into()));
        }
        if self.amount.is_nan() || self.amount <= 0.0 {
            return Err(LedgerError::InvalidInput(
                "subscription amount must be positive".into(),
            ));
        }
        let linked = self.linked_obligation_id.ok_or_else(|| {
            LedgerError::InvalidInput("a linked card is required".into())
        })?;
        Ok(Subscription {
            id: Uuid::new_v4(),
            name: name.to_string(),
            amount: self.amount,
            currency: self.currency,
            billing_day: self.billing_day.unwrap_or(1).clamp(1, 31),
            linked_obligation_id: linked,
            category: self.category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(amount: f64, currency: Currency) -> Subscription {
        SubscriptionDraft {
            name: "Streaming".into(),
            amount,
            currency,
            linked_obligation_id: Some(Uuid::new_v4()),
            ..SubscriptionDraft::default()
        }
        .into_subscription()
        .unwrap()
    }

    #[test]
    fn totals_normalize_foreign_side() {
        let subs = vec![
            sub(500.0, Currency::Local),
            sub(10.0, Currency::Foreign),
            sub(5.5, Currency::Foreign),
        ];
        let totals = aggregate(&subs, 58.5);
        assert_eq!(totals.total_local, 500.0);
        assert_eq!(totals.total_foreign, 15.5);
        assert_eq!(totals.total_normalized_to_local, 500.0 + 15.5 * 58.5);
    }

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(aggregate(&[], 58.5), RecurringTotals::default());
    }

    #[test]
    fn draft_requires_card_and_clamps_day() {
        let missing_card = SubscriptionDraft {
            name: "Gym".into(),
            amount: 10.0,
            ..SubscriptionDraft::default()
        };
        assert!(missing_card.into_subscription().is_err());

        let built = SubscriptionDraft {
            name: "Gym".into(),
            amount: 10.0,
            billing_day: Some(45),
            linked_obligation_id: Some(Uuid::new_v4()),
            ..SubscriptionDraft::default()
        }
        .into_subscription()
        .unwrap();
        assert_eq!(built.billing_day, 31);
        assert_eq!(built.currency, Currency::Foreign);
    }

    #[test]
    fn unknown_card_label_when_unlinked() {
        let card = CreditObligation::new("Banco BHD", "Visa");
        let mut linked = sub(1.0, Currency::Local);
        assert_eq!(linked_obligation_label(&linked, &[card.clone()]), UNKNOWN_CARD_LABEL);
        linked.linked_obligation_id = card.id;
        assert_eq!(linked_obligation_label(&linked, &[card]), "Banco BHD - Visa");
    }
}
