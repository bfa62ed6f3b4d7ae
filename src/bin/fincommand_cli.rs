use std::{env, path::PathBuf, process};

use chrono::{Local, NaiveDate};
use colored::{ColoredString, Colorize};
use uuid::Uuid;

use fincommand_core::{
    cash::{new_obligation, CashPositionSnapshot},
    config::ConfigManager,
    core::{
        services::{
            CashService, ObligationService, SubscriptionService, SummaryService,
            TransactionService, WorkspaceService,
        },
        AppContext, Workspace,
    },
    currency::{format_money, Currency, NegativeStyle},
    debt::{derive_due_date, remaining_balance, ObligationForm, Urgency},
    init,
    ledger::{PeriodFilter, TransactionDraft, TransactionType},
    subscriptions::linked_obligation_label,
    tabular::{import_file, ImportOptions, DEFAULT_FILE_NAME},
    utils::build_info,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        process::exit(1);
    };
    let rest = &args[1..];

    match command.as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            return Ok(());
        }
        "version" | "--version" => {
            println!("{}", build_info::current().describe());
            return Ok(());
        }
        "due-date" => {
            let cutoff = parse_date(arg(rest, 0)?)?;
            let issuer = rest[1..].join(" ");
            println!("{}", derive_due_date(cutoff, &issuer));
            return Ok(());
        }
        _ => {}
    }

    let manager = ConfigManager::new()?;
    let ctx = AppContext::open(&manager)?;
    let mut ws = WorkspaceService::load(&ctx)?;
    let today = Local::now().date_naive();

    match command.as_str() {
        "summary" => {
            let year = match rest.first() {
                Some(raw) => raw.parse()?,
                None => chrono::Datelike::year(&today),
            };
            print_summary(&ctx, &ws, year);
        }
        "overview" => {
            let filter = parse_period(rest.first().map(String::as_str), today)?;
            for row in SummaryService::overview(&ws, filter) {
                println!(
                    "{:<24} ingresos {}  gastos {}  neto {}",
                    row.name,
                    money(&ctx, row.totals.income_local, Currency::Local),
                    money(&ctx, row.totals.expense_local, Currency::Local),
                    money(&ctx, row.totals.net_local, Currency::Local),
                );
            }
        }
        "add" => {
            let kind = parse_kind(arg(rest, 0)?)?;
            let mut draft = TransactionDraft {
                date: Some(parse_date(arg(rest, 1)?)?),
                description: rest.get(3..).map(|words| words.join(" ")),
                ..TransactionDraft::default()
            };
            draft.set_local_amount(parse_amount(arg(rest, 2)?)?, ctx.exchange_rate());
            let id = TransactionService::add(&ctx, &mut ws, draft, kind)?;
            println!("{} {id}", "Transacción guardada".green());
        }
        "list" => {
            for txn in TransactionService::list(&ws) {
                let amount = money(&ctx, txn.amount_local, Currency::Local);
                let amount = if txn.is_income() {
                    amount.green()
                } else {
                    amount.red()
                };
                println!("{}  {:<8} {:<32} {}  {}", txn.date, txn.kind.label(), txn.description, amount, txn.id);
            }
        }
        "delete" => {
            let ids = rest
                .iter()
                .map(|raw| Uuid::parse_str(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let report = TransactionService::remove_many(&ctx, &mut ws, &ids)?;
            match report.notice() {
                Some(notice) => eprintln!("{}", notice.yellow()),
                None => println!("{} {}", "Eliminadas:".green(), report.deleted),
            }
        }
        "cards" => print_cards(&ctx, &ws, today),
        "add-card" => {
            let mut form = ObligationForm::new();
            form.set_issuer(arg(rest, 0)?);
            form.label = arg(rest, 1)?.to_string();
            form.set_cutoff_date(Some(parse_date(arg(rest, 2)?)?));
            form.debt_local = parse_amount(arg(rest, 3)?)?;
            form.debt_foreign = optional_amount(rest, 4)?;
            let id = ObligationService::save(&ctx, &mut ws, &form)?;
            println!("{} {id}", "Tarjeta guardada".green());
        }
        "pay" => {
            let id = Uuid::parse_str(arg(rest, 0)?)?;
            let local = parse_amount(arg(rest, 1)?)?;
            let foreign = optional_amount(rest, 2)?;
            let card = ObligationService::register_payment(&ctx, &mut ws, id, local, foreign)?;
            let left = remaining_balance(&card);
            println!(
                "{} {}  pendiente {} / {}",
                card.display_name(),
                card.status.label(),
                money(&ctx, left.local, Currency::Local),
                money(&ctx, left.foreign, Currency::Foreign)
            );
        }
        "subscriptions" => {
            for sub in &ws.subscriptions {
                println!(
                    "{:<20} {:<10} día {:>2}  {}  {}",
                    sub.name,
                    sub.category.label(),
                    sub.billing_day,
                    money(&ctx, sub.amount, sub.currency),
                    linked_obligation_label(sub, &ws.obligations)
                );
            }
            let totals = SubscriptionService::totals(&ws);
            println!(
                "Total: {} + {} = {}",
                money(&ctx, totals.total_local, Currency::Local),
                money(&ctx, totals.total_foreign, Currency::Foreign),
                money(&ctx, totals.total_normalized_to_local, Currency::Local).bold()
            );
        }
        "quick-count" => print_cash(&ctx, &ws),
        "set-balance" => {
            let next = ws.snapshot.set_balance(arg(rest, 0)?, parse_amount(arg(rest, 1)?)?);
            save_cash(&ctx, &mut ws, next)?;
        }
        "add-weekly" => {
            let amount = rest.get(1).and_then(|raw| parse_amount(raw).ok());
            let row = new_obligation(arg(rest, 0)?, amount)
                .ok_or("se requieren concepto y monto")?;
            let next = ws.snapshot.add_obligation(row);
            save_cash(&ctx, &mut ws, next)?;
        }
        "days" => {
            let next = ws.snapshot.set_days_remaining(arg(rest, 0)?.parse()?);
            save_cash(&ctx, &mut ws, next)?;
        }
        "export" => {
            let path = rest
                .first()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));
            let count = TransactionService::export(&ws, &path)?;
            println!("{} {} ({count})", "Exportado a".green(), path.display());
        }
        "import" => {
            let path = PathBuf::from(arg(rest, 0)?);
            let section = match rest.get(1) {
                Some(raw) => parse_kind(raw)?,
                None => TransactionType::Income,
            };
            let company = ws.selected_company.ok_or("no hay empresa seleccionada")?;
            let rows = import_file(&path, &ImportOptions::new(company, section))?;
            let count = TransactionService::add_many(&ctx, &mut ws, rows)?;
            println!("{} {count}", "Importadas:".green());
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }

    Ok(())
}

fn arg(rest: &[String], index: usize) -> CliResult<&str> {
    rest.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument #{}", index + 1).into())
}

fn parse_date(raw: &str) -> CliResult<NaiveDate> {
    Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
}

/// Finite decimal amount; `NaN` and infinities parse as `f64` but are refused.
fn parse_amount(raw: &str) -> CliResult<f64> {
    let value: f64 = raw.trim().parse()?;
    if !value.is_finite() {
        return Err(format!("`{raw}` is not a valid amount").into());
    }
    Ok(value)
}

fn optional_amount(rest: &[String], index: usize) -> CliResult<f64> {
    match rest.get(index) {
        Some(raw) => parse_amount(raw),
        None => Ok(0.0),
    }
}

fn parse_kind(raw: &str) -> CliResult<TransactionType> {
    match raw.to_lowercase().as_str() {
        "income" | "ingreso" => Ok(TransactionType::Income),
        "expense" | "gasto" => Ok(TransactionType::Expense),
        other => Err(format!("unknown transaction type `{other}`").into()),
    }
}

fn parse_period(raw: Option<&str>, today: NaiveDate) -> CliResult<PeriodFilter> {
    use chrono::Datelike;

    Ok(match raw.unwrap_or("month") {
        "week" => PeriodFilter::Week { today },
        "month" => PeriodFilter::Month {
            year: today.year(),
            month: today.month(),
        },
        "year" => PeriodFilter::Year(today.year()),
        "all" => PeriodFilter::All,
        other => return Err(format!("unknown period `{other}`").into()),
    })
}

fn money(ctx: &AppContext, amount: f64, currency: Currency) -> String {
    format_money(amount, currency, &ctx.config().locale, NegativeStyle::Sign)
}

fn urgency_badge(urgency: Urgency) -> ColoredString {
    let label = urgency.label();
    match urgency {
        Urgency::Paid => label.green(),
        Urgency::OnTrack => label.cyan(),
        Urgency::Attention => label.yellow(),
        Urgency::Critical => label.red(),
        Urgency::Overdue => label.red().bold(),
    }
}

fn print_summary(ctx: &AppContext, ws: &Workspace, year: i32) {
    let Some(summary) = SummaryService::ledger(ws, year) else {
        println!("No hay empresa seleccionada.");
        return;
    };
    let company = ws
        .selected_company()
        .map(|company| company.name.as_str())
        .unwrap_or_default();
    println!("{}", format!("=== {} · {year} ===", company).bold());
    let totals = summary.totals;
    println!(
        "Ingresos {} / {}",
        money(ctx, totals.income_local, Currency::Local).green(),
        money(ctx, totals.income_foreign, Currency::Foreign).green()
    );
    println!(
        "Gastos   {} / {}",
        money(ctx, totals.expense_local, Currency::Local).red(),
        money(ctx, totals.expense_foreign, Currency::Foreign).red()
    );
    println!(
        "Neto     {} / {}",
        money(ctx, totals.net_local, Currency::Local).bold(),
        money(ctx, totals.net_foreign, Currency::Foreign).bold()
    );
    for bucket in summary.monthly {
        println!(
            "  {}  +{:>12.2}  -{:>12.2}",
            bucket.label, bucket.income, bucket.expense
        );
    }
}

fn print_cards(ctx: &AppContext, ws: &Workspace, today: NaiveDate) {
    for (card, urgency) in ObligationService::by_urgency(ws, today) {
        let left = remaining_balance(card);
        let due = card
            .due_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "sin fecha".into());
        println!(
            "{:<28} {:<10} vence {}  ({} días)  {} / {}  {}",
            card.display_name(),
            urgency_badge(urgency),
            due,
            card.days_until_due(today),
            money(ctx, left.local, Currency::Local),
            money(ctx, left.foreign, Currency::Foreign),
            card.id
        );
    }
}

fn print_cash(ctx: &AppContext, ws: &Workspace) {
    for source in &ws.snapshot.balances {
        println!("{:<20} {}", source.name, money(ctx, source.amount, Currency::Local));
    }
    for row in &ws.snapshot.weekly_obligations {
        let mark = if row.is_paid { "[x]" } else { "[ ]" };
        println!(
            "{mark} {:<24} {:<8} {}",
            row.concept,
            row.settlement_mode.label(),
            money(ctx, row.amount, Currency::Local)
        );
    }
    let plan = CashService::plan(ws);
    println!("Disponible   {}", money(ctx, plan.total_available, Currency::Local));
    println!("Compromisos  {}", money(ctx, plan.total_obligations, Currency::Local));
    let shortfall = money(ctx, plan.shortfall, Currency::Local);
    if plan.shortfall > 0.0 {
        println!("Faltante     {}", shortfall.red());
    } else {
        println!("Faltante     {}", shortfall.green());
    }
    println!(
        "Meta diaria  {} ({} días)",
        money(ctx, plan.daily_target, Currency::Local).bold(),
        ws.snapshot.days_remaining
    );
    println!("Publicidad   {}", money(ctx, plan.ad_spend_local, Currency::Local));
}

fn save_cash(ctx: &AppContext, ws: &mut Workspace, next: CashPositionSnapshot) -> CliResult<()> {
    if CashService::save(ctx, ws, next)? {
        println!("{}", "Cuadre guardado".green());
    } else {
        println!("Sin cambios.");
    }
    print_cash(ctx, ws);
    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: fincommand_cli <command>\n\
         Commands:\n  \
         summary [year]\n  \
         overview [week|month|year|all]\n  \
         add <income|expense> <YYYY-MM-DD> <amount RD$> [description]\n  \
         list\n  \
         delete <id>...\n  \
         cards\n  \
         add-card <issuer> <label> <cutoff YYYY-MM-DD> <debt RD$> [debt US$]\n  \
         pay <card-id> <RD$> [US$]\n  \
         due-date <cutoff YYYY-MM-DD> <issuer>\n  \
         subscriptions\n  \
         quick-count\n  \
         set-balance <source> <amount>\n  \
         add-weekly <concept> <amount>\n  \
         days <1-31>\n  \
         export [file.xlsx]\n  \
         import <file.xlsx> [income|expense]\n  \
         version"
    );
}
