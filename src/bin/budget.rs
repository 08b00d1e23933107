use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use time::{Date, macros::format_description};

use budget_sync::{
    AppState, BudgetId, CacheConfig, Error, MonthKey, SqliteRecordStore, Subscription,
    TransactionId,
    budget::BudgetForm,
    config::DEFAULT_REFRESH_INTERVAL,
    dashboard::DashboardSummary,
    format::{format_currency, format_percentage},
    logging::setup_logging,
    timezone::local_today,
    transaction::{Transaction, TransactionForm},
};

/// Track spending against monthly budgets.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "BUDGET_DB_PATH", default_value = "budget.db")]
    db_path: PathBuf,

    /// Canonical name of the local timezone, e.g. "Pacific/Auckland". Used to
    /// work out the current month.
    #[arg(long, env = "BUDGET_TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// Seconds between two refreshes of the cached data.
    #[arg(long, env = "BUDGET_REFRESH_INTERVAL", default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
    refresh_interval: u64,

    /// Also write debug logs to this file.
    #[arg(long, env = "BUDGET_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new transaction.
    Add {
        /// The amount spent.
        amount: f64,
        /// One of Food, Rent, Transport, Utilities, Entertainment or Other.
        #[arg(short, long)]
        category: String,
        /// The date of the transaction as YYYY-MM-DD, defaults to today.
        #[arg(short, long, value_parser = parse_date)]
        date: Option<Date>,
        /// A note about the transaction.
        #[arg(long)]
        description: Option<String>,
    },
    /// Replace a transaction.
    Edit {
        /// The ID of the transaction to replace.
        id: TransactionId,
        /// The amount spent.
        amount: f64,
        /// One of Food, Rent, Transport, Utilities, Entertainment or Other.
        #[arg(short, long)]
        category: String,
        /// The date of the transaction as YYYY-MM-DD, defaults to today.
        #[arg(short, long, value_parser = parse_date)]
        date: Option<Date>,
        /// A note about the transaction.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a transaction.
    Delete {
        /// The ID of the transaction to delete.
        id: TransactionId,
    },
    /// Set the budget for a category in a month.
    SetBudget {
        /// The most that should be spent in the category.
        amount: f64,
        /// One of Food, Rent, Transport, Utilities, Entertainment or Other.
        #[arg(short, long)]
        category: String,
        /// The month as YYYY-MM, defaults to the current month.
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Delete a budget.
    DeleteBudget {
        /// The ID of the budget to delete.
        id: BudgetId,
    },
    /// List every transaction and this month's budgets.
    List,
    /// Show the dashboard for the current month.
    Summary {
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the dashboard and redraw it whenever the data changes.
    Watch,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    App(#[from] Error),

    #[error("could not serialize the summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not set up logging: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(args.log_file.as_deref()) {
        eprintln!("could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let connection = Connection::open(&args.db_path).map_err(Error::from)?;
    let store = SqliteRecordStore::new(connection)?;
    let config = CacheConfig::new(Duration::from_secs(args.refresh_interval));
    let state = AppState::new(store, config);
    let today = local_today(&args.timezone)?;

    match args.command {
        Command::Add {
            amount,
            category,
            date,
            description,
        } => {
            let form = TransactionForm {
                amount,
                date: Some(date.unwrap_or(today)),
                category,
                description,
            };
            let transaction = state.create_transaction(form).await?;
            tracing::info!("Created transaction {}", transaction.id);
            println!("{}", render_transaction(&transaction));
        }
        Command::Edit {
            id,
            amount,
            category,
            date,
            description,
        } => {
            let form = TransactionForm {
                amount,
                date: Some(date.unwrap_or(today)),
                category,
                description,
            };
            let transaction = state.update_transaction(id, form).await?;
            tracing::info!("Updated transaction {id}");
            println!("{}", render_transaction(&transaction));
        }
        Command::Delete { id } => {
            state.delete_transaction(id).await?;
            tracing::info!("Deleted transaction {id}");
        }
        Command::SetBudget {
            amount,
            category,
            month,
        } => {
            let form = BudgetForm {
                category,
                month: month.unwrap_or_else(|| MonthKey::from_date(today).to_string()),
                amount,
            };
            let budget = state.upsert_budget(form).await?;
            tracing::info!("Set budget {}", budget.id);
            println!(
                "{:>4}  {}  {:<13} {:>12}",
                budget.id,
                budget.month,
                budget.category,
                format_currency(budget.amount)
            );
        }
        Command::DeleteBudget { id } => {
            state.delete_budget(id).await?;
            tracing::info!("Deleted budget {id}");
        }
        Command::List => {
            let (mut transactions, mut budgets) = subscribe(&state, today);
            let transactions = transactions.loaded().await;
            let budgets = budgets.loaded().await;
            warn_if_stale(&[&transactions, &budgets]);

            for transaction in transactions.snapshot.transactions() {
                println!("{}", render_transaction(transaction));
            }

            println!();
            println!("Budgets for {}", MonthKey::from_date(today).label());
            for budget in budgets.snapshot.budgets() {
                println!(
                    "{:>4}  {:<13} {:>12}",
                    budget.id,
                    budget.category,
                    format_currency(budget.amount)
                );
            }
        }
        Command::Summary { json } => {
            let (mut transactions, mut budgets) = subscribe(&state, today);
            let transactions = transactions.loaded().await;
            let budgets = budgets.loaded().await;
            warn_if_stale(&[&transactions, &budgets]);

            let summary = DashboardSummary::new(
                transactions.snapshot.transactions(),
                budgets.snapshot.budgets(),
                today,
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", render_summary(&summary));
            }
        }
        Command::Watch => watch(&state, today).await?,
    }

    Ok(())
}

/// Redraw the summary every time either snapshot changes, until ctrl+c.
async fn watch(state: &AppState<SqliteRecordStore>, today: Date) -> Result<(), CliError> {
    let _polling = state.cache().spawn_polling();
    let (mut transactions, mut budgets) = subscribe(state, today);
    transactions.loaded().await;
    budgets.loaded().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let transactions_state = transactions.current();
        let budgets_state = budgets.current();
        warn_if_stale(&[&transactions_state, &budgets_state]);

        let summary = DashboardSummary::new(
            transactions_state.snapshot.transactions(),
            budgets_state.snapshot.budgets(),
            today,
        );
        println!("{}\n", render_summary(&summary));

        tokio::select! {
            result = &mut shutdown => {
                result?;
                tracing::debug!("Received ctrl+c signal.");
                return Ok(());
            }
            Some(_) = transactions.changed() => {}
            Some(_) = budgets.changed() => {}
            else => return Ok(()),
        }
    }
}

fn subscribe(state: &AppState<SqliteRecordStore>, today: Date) -> (Subscription, Subscription) {
    (
        state.subscribe_transactions(),
        state.subscribe_budgets(MonthKey::from_date(today)),
    )
}

fn warn_if_stale(states: &[&budget_sync::EntryState]) {
    for state in states {
        if let Some(error) = &state.error {
            tracing::warn!("Showing the last data that could be loaded: {error}");
        }
    }
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("{text} is not a valid date, use YYYY-MM-DD: {error}"))
}

fn render_transaction(transaction: &Transaction) -> String {
    format!(
        "{:>4}  {}  {:<13} {:>12}  {}",
        transaction.id,
        transaction.date,
        transaction.category,
        format_currency(transaction.amount),
        transaction.description.as_deref().unwrap_or("")
    )
}

fn render_summary(summary: &DashboardSummary) -> String {
    let mut lines = vec![
        format!("Dashboard for {}", summary.month.label()),
        format!("Total spent: {}", format_currency(summary.total_spent)),
        format!(
            "This month: {} ({} vs last month)",
            format_currency(summary.month_over_month.current),
            format_percentage(summary.month_over_month.percentage_change)
        ),
        String::new(),
        "Spending by category".to_owned(),
    ];

    for share in &summary.category_breakdown {
        lines.push(format!(
            "  {:<13} {:>12} {:>7}",
            share.category,
            format_currency(share.total),
            format_percentage(share.percentage)
        ));
    }

    lines.push(String::new());
    lines.push("Spending by month".to_owned());
    for month in &summary.monthly_totals {
        lines.push(format!(
            "  {:<13} {:>12}",
            month.label,
            format_currency(month.total)
        ));
    }

    lines.push(String::new());
    lines.push("Budget vs actual".to_owned());
    for row in &summary.budget_comparison {
        lines.push(format!(
            "  {:<13} {:>12} {:>12} {:>12} left",
            row.category,
            format_currency(row.budget_amount),
            format_currency(row.actual_amount),
            format_currency(row.remaining)
        ));
    }

    if !summary.budget_insights.is_empty() {
        lines.push(String::new());
        lines.push("Budget insights".to_owned());
    }
    for insight in &summary.budget_insights {
        lines.push(format!(
            "  {:<13} {:>7} used, {} left [{}]",
            insight.category,
            format_percentage(insight.percentage_used),
            format_currency(insight.remaining),
            insight.status
        ));
    }

    lines.join("\n")
}
