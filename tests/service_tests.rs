mod common;

use chrono::{Duration, NaiveDate, Utc};
use fincommand_core::{
    cash::{new_obligation, SettlementMode},
    config::Config,
    core::services::{
        CashService, ClientService, CompanyService, ObligationService, ServiceError,
        SubscriptionService, SummaryService, TransactionService, WorkspaceService,
    },
    currency::{Currency, DualAmount},
    debt::{ObligationForm, ObligationStatus, Urgency},
    ledger::{Company, PeriodFilter, TransactionDraft, TransactionPatch, TransactionType},
    store::{RecordStore, StoreOp},
    subscriptions::{SubscriptionCategory, SubscriptionDraft},
};
use uuid::Uuid;

use common::{memory_env, setup_test_env};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(day: u32, amount: f64) -> TransactionDraft {
    TransactionDraft {
        date: Some(date(2024, 3, day)),
        amount_local: amount,
        ..TransactionDraft::default()
    }
}

fn card_form(issuer: &str, debt_local: f64) -> ObligationForm {
    let mut form = ObligationForm::new();
    form.set_issuer(issuer);
    form.label = "Visa".into();
    form.set_cutoff_date(Some(date(2024, 5, 1)));
    form.debt_local = debt_local;
    form
}

#[test]
fn chunked_delete_reports_failed_chunk_and_keeps_its_rows() {
    let config = Config {
        delete_batch_size: 2,
        ..Config::default()
    };
    let (ctx, store, mut ws) = memory_env(config);
    let ids: Vec<Uuid> = (1..=5)
        .map(|day| {
            TransactionService::add(&ctx, &mut ws, draft(day, 100.0), TransactionType::Expense)
                .unwrap()
        })
        .collect();

    store.arm_failure(StoreOp::DeleteTransactions, 1);
    let report = TransactionService::remove_many(&ctx, &mut ws, &ids).unwrap();

    assert_eq!(report.requested, 5);
    assert_eq!(report.deleted, 3);
    assert_eq!(report.failed_ids, ids[..2].to_vec());
    assert_eq!(report.errors.len(), 1);
    assert!(report.notice().unwrap().starts_with("2 de 5"));

    let kept: Vec<Uuid> = ws.transactions.iter().map(|txn| txn.id).collect();
    assert_eq!(kept, ids[..2].to_vec());
    assert_eq!(ctx.store().list_transactions(ws.owner).unwrap().len(), 2);
}

#[test]
fn failed_update_restores_local_copy() {
    let (ctx, store, mut ws) = memory_env(Config::default());
    let id = TransactionService::add(&ctx, &mut ws, draft(4, 250.0), TransactionType::Income)
        .unwrap();
    let before = ws.transaction(id).cloned().unwrap();

    store.arm_failure(StoreOp::UpdateTransaction, 1);
    let patch = TransactionPatch {
        description: Some("Cambiado".into()),
        ..TransactionPatch::default()
    };
    let err = TransactionService::update(&ctx, &mut ws, id, &patch).unwrap_err();

    assert!(matches!(err, ServiceError::Remote(_)));
    assert!(err.to_string().starts_with("no se pudo guardar el cambio"));
    assert_eq!(ws.transaction(id), Some(&before));

    TransactionService::update(&ctx, &mut ws, id, &patch).unwrap();
    assert_eq!(ws.transaction(id).unwrap().description, "Cambiado");
}

#[test]
fn failed_bulk_insert_leaves_workspace_untouched() {
    let (ctx, store, mut ws) = memory_env(Config::default());
    let company = ws.selected_company.unwrap();
    let rows = vec![
        draft(1, 10.0).into_transaction(company, TransactionType::Income).unwrap(),
        draft(2, 20.0).into_transaction(company, TransactionType::Expense).unwrap(),
    ];

    store.arm_failure(StoreOp::InsertTransactions, 1);
    assert!(TransactionService::add_many(&ctx, &mut ws, rows.clone()).is_err());
    assert!(ws.transactions.is_empty());

    assert_eq!(TransactionService::add_many(&ctx, &mut ws, rows).unwrap(), 2);
    assert_eq!(TransactionService::list(&ws).len(), 2);
}

#[test]
fn cash_save_syncs_weekly_rows_by_id() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    let rent = new_obligation("Alquiler", Some(1500.0)).unwrap();
    let payroll = new_obligation("Nómina", Some(800.0)).unwrap();
    let rent_id = rent.id;

    let next = ws
        .snapshot
        .set_balance("Banco Popular", 1000.0)
        .add_obligation(rent)
        .add_obligation(payroll)
        .set_days_remaining(5);
    assert!(CashService::save(&ctx, &mut ws, next).unwrap());
    let snapshot_id = ws.snapshot.id.expect("snapshot id assigned on first save");

    let next = ws.snapshot.toggle_settlement_mode(rent_id);
    assert!(CashService::save(&ctx, &mut ws, next).unwrap());

    let stored = ctx.store().list_weekly(ws.owner, snapshot_id).unwrap();
    assert_eq!(stored.len(), 2);
    let stored_rent = stored.iter().find(|row| row.id == rent_id).unwrap();
    assert_eq!(stored_rent.settlement_mode, SettlementMode::Half);

    let plan = CashService::plan(&ws);
    assert_eq!(plan.total_obligations, 2300.0);
    assert_eq!(plan.shortfall, 1300.0);
    assert_eq!(plan.daily_target, 260.0);
}

#[test]
fn unchanged_cash_snapshot_skips_the_write() {
    let (ctx, store, mut ws) = memory_env(Config::default());
    let next = ws.snapshot.set_balance("Banco BHD", 50.0);
    assert!(CashService::save(&ctx, &mut ws, next).unwrap());

    store.arm_failure(StoreOp::UpsertSnapshot, 1);
    let same = ws.snapshot.clone();
    assert!(!CashService::save(&ctx, &mut ws, same).unwrap());
}

#[test]
fn failed_cash_save_reverts_to_previous_snapshot() {
    let (ctx, store, mut ws) = memory_env(Config::default());
    let before = ws.snapshot.clone();

    store.arm_failure(StoreOp::UpsertSnapshot, 1);
    let next = ws.snapshot.set_balance("BanReservas", 900.0);
    assert!(CashService::save(&ctx, &mut ws, next).is_err());
    assert_eq!(ws.snapshot, before);
}

#[test]
fn payments_move_card_status_and_urgency() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    let id = ObligationService::save(&ctx, &mut ws, &card_form("Banco BHD", 1000.0)).unwrap();
    assert_eq!(ws.obligation(id).unwrap().due_date, Some(date(2024, 5, 26)));

    let card = ObligationService::register_payment(&ctx, &mut ws, id, 400.0, 0.0).unwrap();
    assert_eq!(card.status, ObligationStatus::PartiallyPaid);

    let card = ObligationService::register_payment(&ctx, &mut ws, id, 600.0, 0.0).unwrap();
    assert_eq!(card.status, ObligationStatus::Paid);
    let ranked = ObligationService::by_urgency(&ws, date(2024, 5, 25));
    assert_eq!(ranked[0].1, Urgency::Paid);

    let stored = ctx.store().list_obligations(ws.owner).unwrap();
    assert_eq!(stored[0].paid_local, 1000.0);

    assert!(ObligationService::register_payment(&ctx, &mut ws, id, -1.0, 0.0).is_err());
}

#[test]
fn subscriptions_need_an_existing_card() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    let orphan = SubscriptionDraft {
        name: "Netflix".into(),
        amount: 12.0,
        currency: Currency::Foreign,
        billing_day: Some(15),
        linked_obligation_id: Some(Uuid::new_v4()),
        category: SubscriptionCategory::Luxury,
    };
    assert!(SubscriptionService::add(&ctx, &mut ws, orphan.clone()).is_err());

    let card = ObligationService::save(&ctx, &mut ws, &card_form("Popular", 0.0)).unwrap();
    let linked = SubscriptionDraft {
        linked_obligation_id: Some(card),
        ..orphan
    };
    SubscriptionService::add(&ctx, &mut ws, linked).unwrap();

    let totals = SubscriptionService::totals(&ws);
    assert_eq!(totals.total_foreign, 12.0);
    assert_eq!(totals.total_normalized_to_local, 12.0 * 58.5);
}

#[test]
fn removing_a_client_removes_its_tasks() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    let client = ClientService::add_client(&ctx, &mut ws, "Ferretería Ruiz", "809-555-0100").unwrap();
    let other = ClientService::add_client(&ctx, &mut ws, "Colmado Luz", "").unwrap();
    let due = Utc::now() + Duration::days(2);
    ClientService::add_task(&ctx, &mut ws, client, "Enviar cotización", due).unwrap();
    ClientService::add_task(&ctx, &mut ws, other, "Cobrar factura", due).unwrap();

    ClientService::remove_client(&ctx, &mut ws, client).unwrap();

    assert_eq!(ws.clients.len(), 1);
    assert_eq!(ws.tasks.len(), 1);
    let stored = ctx.store().list_tasks(ws.owner).unwrap();
    assert!(stored.iter().all(|task| task.client_id == other));
}

#[test]
fn company_breakdown_splits_by_company() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    let main = ws.selected_company.unwrap();
    TransactionService::add(&ctx, &mut ws, draft(3, 500.0), TransactionType::Income).unwrap();

    let branch = CompanyService::add(&ctx, &mut ws, Company::named("Sucursal")).unwrap();
    CompanyService::select(&mut ws, branch).unwrap();
    TransactionService::add(&ctx, &mut ws, draft(3, 200.0), TransactionType::Expense).unwrap();

    let rows = SummaryService::overview(&ws, PeriodFilter::Year(2024));
    let main_row = rows.iter().find(|row| row.company_id == main).unwrap();
    let branch_row = rows.iter().find(|row| row.company_id == branch).unwrap();
    assert_eq!(main_row.totals.net_local, 500.0);
    assert_eq!(branch_row.totals.net_local, -200.0);

    let summary = SummaryService::ledger(&ws, 2024).unwrap();
    assert_eq!(summary.totals.expense_local, 200.0);
    assert_eq!(summary.monthly[2].expense, 200.0);
}

#[test]
fn json_store_survives_a_reload() {
    let (ctx, manager) = setup_test_env();
    let mut ws = WorkspaceService::load(&ctx).unwrap();
    let id = TransactionService::add(&ctx, &mut ws, draft(9, 75.0), TransactionType::Expense)
        .unwrap();
    let card = ObligationService::save(&ctx, &mut ws, &card_form("Reservas", 300.0)).unwrap();

    let reopened = fincommand_core::core::AppContext::open(&manager).unwrap();
    let reloaded = WorkspaceService::load(&reopened).unwrap();

    assert_eq!(reloaded.companies.len(), 1);
    assert_eq!(reloaded.selected_company, ws.selected_company);
    assert_eq!(reloaded.transaction(id).unwrap().amount(), DualAmount::new(75.0, 0.0));
    assert_eq!(reloaded.obligation(card).unwrap().debt_local, 300.0);
}

#[test]
fn non_finite_payment_is_refused_and_card_stays_payable() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    let id = ObligationService::save(&ctx, &mut ws, &card_form("Popular", 5000.0)).unwrap();

    let err = ObligationService::register_payment(&ctx, &mut ws, id, f64::NAN, 0.0).unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));
    assert!(ObligationService::register_payment(&ctx, &mut ws, id, 0.0, f64::INFINITY).is_err());
    assert_eq!(ws.obligation(id).unwrap().paid_local, 0.0);

    let card = ObligationService::register_payment(&ctx, &mut ws, id, 5000.0, 0.0).unwrap();
    assert_eq!(card.status, ObligationStatus::Paid);
    assert_eq!(fincommand_core::debt::remaining_balance(&card), DualAmount::ZERO);
}

#[test]
fn non_finite_or_negative_entries_never_reach_the_ledger() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    assert!(TransactionService::add(&ctx, &mut ws, draft(5, -500.0), TransactionType::Income).is_err());
    assert!(TransactionService::add(&ctx, &mut ws, draft(5, f64::NAN), TransactionType::Expense).is_err());
    assert!(ws.transactions.is_empty());
    assert!(ctx.store().list_transactions(ws.owner).unwrap().is_empty());
}

#[test]
fn export_includes_every_company() {
    let (ctx, _store, mut ws) = memory_env(Config::default());
    let main = ws.selected_company.unwrap();
    let branch = CompanyService::add(&ctx, &mut ws, Company::named("Sucursal")).unwrap();
    CompanyService::select(&mut ws, branch).unwrap();
    let mut sale = draft(8, 900.0);
    sale.description = Some("Venta sucursal".into());
    TransactionService::add(&ctx, &mut ws, sale, TransactionType::Income).unwrap();
    CompanyService::select(&mut ws, main).unwrap();
    assert!(TransactionService::list(&ws).is_empty());

    let path = common::temp_base().join("todas.xlsx");
    assert_eq!(TransactionService::export(&ws, &path).unwrap(), 1);

    let imported = fincommand_core::tabular::import_file(
        &path,
        &fincommand_core::tabular::ImportOptions::new(main, TransactionType::Income),
    )
    .unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].description, "Venta sucursal");
    assert_eq!(imported[0].amount_local, 900.0);
}
