use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use walletwise::config::{self, OutputFormat, SimpleOutputFormat};
use walletwise::data_access::{FinanceData, Session};
use walletwise::document::{ReportInput, build_report_document, report_file_name};
use walletwise::metrics::{
    self, ActivityItem, BudgetStatus, OverviewMetrics, RECENT_ACTIVITY_LIMIT,
};
use walletwise::models::{
    BudgetPeriod, NewBudget, NewSavingsGoal, NewTransaction, TransactionKind,
};
use walletwise::report::{self, write_csv_string};
use walletwise::store::{HttpStoreClient, StoreApi};
use walletwise::visual_report::{format_currency, render_report_html};

#[derive(Parser, Debug)]
#[clap(author = "Simon Zeng", version, about = "WalletWise personal finance reports")]
struct Args {
    /// Path to config.json
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch records and print or export the dashboard report (default)
    Report,
    /// Log an income or expense transaction
    AddTransaction {
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        description: String,
        /// Category id
        #[arg(long)]
        category: String,
        #[arg(long, value_enum, default_value_t = TransactionKind::Expense)]
        kind: TransactionKind,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Set a spending ceiling for a category
    AddBudget {
        #[arg(long)]
        amount: f64,
        /// Category id
        #[arg(long)]
        category: String,
        #[arg(long, value_enum, default_value_t = BudgetPeriod::Monthly)]
        period: BudgetPeriod,
    },
    /// Create a savings goal
    AddGoal {
        #[arg(long)]
        title: String,
        #[arg(long)]
        target: f64,
        #[arg(long)]
        target_date: Option<NaiveDate>,
    },
    /// Add funds to an existing savings goal
    FundGoal {
        #[arg(long)]
        id: String,
        #[arg(long)]
        amount: f64,
    },
}

fn session_from_config(cfg: &config::Config) -> Option<Session> {
    cfg.user_id.as_ref().map(|user_id| Session {
        user_id: user_id.clone(),
        email: cfg.user_email.clone(),
    })
}

fn run(api: &dyn StoreApi, cfg: &config::Config, command: Command) -> Result<()> {
    let session = session_from_config(cfg);
    if session.is_none() {
        tracing::warn!("no userId configured; user-scoped records will be empty");
    }
    let mut data = FinanceData::new(api, session);
    let today = cfg
        .resolution_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    match command {
        Command::Report => run_report(&mut data, cfg, today),
        Command::AddTransaction {
            amount,
            description,
            category,
            kind,
            date,
        } => {
            let txn = data.add_transaction(NewTransaction {
                amount,
                description,
                category_id: Some(category),
                kind,
                date: date.unwrap_or(today),
            })?;
            println!(
                "Added {} {:?} transaction {} on {}",
                format_currency(txn.amount, true),
                txn.kind,
                txn.id,
                txn.date
            );
            Ok(())
        }
        Command::AddBudget {
            amount,
            category,
            period,
        } => {
            let budget = data.add_budget(NewBudget {
                amount,
                category_id: category,
                period,
            })?;
            println!(
                "Added {:?} budget {} of {}",
                budget.period,
                budget.id,
                format_currency(budget.amount, true)
            );
            Ok(())
        }
        Command::AddGoal {
            title,
            target,
            target_date,
        } => {
            let goal = data.add_savings_goal(NewSavingsGoal {
                title,
                target_amount: target,
                target_date,
            })?;
            println!(
                "Created savings goal {} ({}) targeting {}",
                goal.title,
                goal.id,
                format_currency(goal.target_amount, true)
            );
            Ok(())
        }
        Command::FundGoal { id, amount } => {
            let goal = data.add_funds(&id, amount)?;
            println!(
                "Added {} to {}; now {} of {}",
                format_currency(amount, true),
                goal.title,
                format_currency(goal.current_amount, true),
                format_currency(goal.target_amount, true)
            );
            Ok(())
        }
    }
}

fn run_report(data: &mut FinanceData<'_>, cfg: &config::Config, today: NaiveDate) -> Result<()> {
    let transactions = data.transactions()?;
    let categories = data.categories()?;
    let budgets = data.budgets()?;
    let goals = data.savings_goals()?;

    let overview = metrics::overview_metrics(&transactions, today);
    let progress = metrics::budget_progress(&budgets, &transactions, today);
    let series = metrics::monthly_series(&transactions, today, cfg.month_window);
    let distribution =
        metrics::category_distribution(&transactions, &categories, cfg.category_labels);
    let activity = metrics::recent_activity(&transactions, &categories, RECENT_ACTIVITY_LIMIT);

    for budget in progress.iter().filter(|p| p.status == BudgetStatus::Over) {
        tracing::warn!(
            category = %budget.category_name,
            percentage = budget.percentage,
            "budget exceeded"
        );
    }

    let series_table = report::build_series_table(report::monthly_series_to_polars(&series)?)?;
    let distribution_table =
        report::build_distribution_table(report::category_distribution_to_polars(&distribution)?)?;
    let budget_table = report::build_budget_table(report::budget_progress_to_polars(&progress)?)?;

    match &cfg.output_format {
        OutputFormat::Simple(SimpleOutputFormat::PolarsPrint) => {
            // SAFETY: single-threaded at this point, no concurrent env access
            unsafe { std::env::set_var("POLARS_FMT_MAX_ROWS", "-1") };
            print_overview(&overview, today);
            let series_df = series_table.collect().context("collecting monthly series")?;
            let distribution_df = distribution_table
                .collect()
                .context("collecting category distribution")?;
            let budget_df = budget_table.collect().context("collecting budgets")?;
            println!("Income vs expenses");
            println!("{series_df}");
            println!("Spending by category");
            println!("{distribution_df}");
            println!("Budget progress");
            println!("{budget_df}");
            print_activity(&activity);
        }
        OutputFormat::Simple(SimpleOutputFormat::CsvPrint) => {
            let mut series_df = series_table.collect().context("collecting monthly series")?;
            let mut distribution_df = distribution_table
                .collect()
                .context("collecting category distribution")?;
            let mut budget_df = budget_table.collect().context("collecting budgets")?;
            print!("{}", write_csv_string(&mut series_df)?);
            println!("category_distribution");
            print!("{}", write_csv_string(&mut distribution_df)?);
            println!("budget_progress");
            print!("{}", write_csv_string(&mut budget_df)?);
        }
        OutputFormat::CsvFile { csv_output } => {
            let mut series_df = series_table.collect().context("collecting monthly series")?;
            let mut distribution_df = distribution_table
                .collect()
                .context("collecting category distribution")?;
            let mut budget_df = budget_table.collect().context("collecting budgets")?;

            let stem = csv_output
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("report");
            let ext = csv_output
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("csv");
            let categories_path = csv_output.with_file_name(format!("{stem}_categories.{ext}"));
            let budgets_path = csv_output.with_file_name(format!("{stem}_budgets.{ext}"));

            write_file(csv_output, &write_csv_string(&mut series_df)?)?;
            write_file(&categories_path, &write_csv_string(&mut distribution_df)?)?;
            write_file(&budgets_path, &write_csv_string(&mut budget_df)?)?;
        }
        OutputFormat::VisualFile { visual_output } => {
            let generated_for = data
                .session()
                .and_then(|s| s.email.clone());
            let document = build_report_document(&ReportInput {
                generated_for,
                generated_on: today,
                overview,
                budgets,
                goals,
            });
            let path = if visual_output.is_dir() {
                visual_output.join(report_file_name(today))
            } else {
                visual_output.clone()
            };
            write_file(&path, &render_report_html(&document))?;
            tracing::info!(path = %path.display(), pages = document.pages.len(), "report written");
        }
    }

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {path:?}"))
}

fn print_overview(overview: &OverviewMetrics, today: NaiveDate) {
    println!("{}", today.format("Overview for %B %Y"));
    println!(
        "Total balance {}, monthly income {}, monthly expenses {}, savings rate {:.1}%",
        format_currency(overview.total_balance, true),
        format_currency(overview.monthly_income, true),
        format_currency(overview.monthly_expenses, true),
        overview.display_savings_rate()
    );
}

fn print_activity(activity: &[ActivityItem]) {
    println!("Recent transactions");
    if activity.is_empty() {
        println!("  none yet");
    }
    for item in activity {
        println!(
            "  {} {:<24} {:<16} {:>12}",
            item.date,
            item.description,
            item.category_name,
            format_currency(item.signed_amount, true)
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = config::load_config(&args.config)?;
    let api = HttpStoreClient::new(&cfg.supabase_url, &cfg.anon_key, &cfg.access_token)?;
    run(&api, &cfg, args.command.unwrap_or(Command::Report))
}
