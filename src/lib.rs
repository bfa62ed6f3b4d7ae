#![doc(test(attr(deny(warnings))))]

//! FinCommand Core models a small business's money: a dual-currency
//! transaction ledger split by company, credit-card debts with due-date
//! urgency, recurring subscriptions, a weekly cash-position planner, and
//! spreadsheet exchange, on top of a pluggable record store.

pub mod auth;
pub mod cash;
pub mod clients;
pub mod config;
pub mod core;
pub mod currency;
pub mod debt;
pub mod errors;
pub mod ledger;
pub mod store;
pub mod subscriptions;
pub mod tabular;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("FinCommand core tracing initialized.");
    });
}
