use clap::Parser;
use finance_planner::args::{
    Args, Command, ExpenseCommand, LoanCommand, SalaryCommand, SideIncomeCommand, ThemeCommand,
};
use finance_planner::{commands, error_type, Config, ErrorType, IntoResult, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            match error_type(&e) {
                Some(ErrorType::Input) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.share_url()).await?.print(),

        Command::Summary => commands::summary(&load(home).await?).await?.print(),

        Command::Expense(expense) => {
            let config = load(home).await?;
            match expense {
                ExpenseCommand::Add(args) => {
                    commands::expense_add(&config, args.clone()).await?.print()
                }
                ExpenseCommand::List => commands::expense_list(&config).await?.print(),
                ExpenseCommand::Update(args) => {
                    commands::expense_update(&config, args.clone())
                        .await?
                        .print()
                }
                ExpenseCommand::Delete(args) => {
                    commands::expense_delete(&config, &args.id).await?.print()
                }
            }
        }

        Command::Loan(loan) => {
            let config = load(home).await?;
            match loan {
                LoanCommand::Add(args) => commands::loan_add(&config, args.clone()).await?.print(),
                LoanCommand::List => commands::loan_list(&config).await?.print(),
                LoanCommand::Update(args) => {
                    commands::loan_update(&config, args.clone()).await?.print()
                }
                LoanCommand::Delete(args) => {
                    commands::loan_delete(&config, &args.id).await?.print()
                }
            }
        }

        Command::Salary(salary) => {
            let config = load(home).await?;
            match salary {
                SalaryCommand::Show => commands::salary_show(&config).await?.print(),
                SalaryCommand::Set { amount } => {
                    commands::salary_set(&config, *amount).await?.print()
                }
            }
        }

        Command::SideIncome(side_income) => {
            let config = load(home).await?;
            match side_income {
                SideIncomeCommand::Add { amount, source } => {
                    commands::side_income_add(&config, amount.clone(), source)
                        .await?
                        .print()
                }
                SideIncomeCommand::List => commands::side_income_list(&config).await?.print(),
                SideIncomeCommand::Remove { position } => {
                    commands::side_income_remove(&config, *position)
                        .await?
                        .print()
                }
            }
        }

        Command::Theme(theme) => {
            let config = load(home).await?;
            match theme {
                ThemeCommand::Show => commands::theme_show(&config).await?.print(),
                ThemeCommand::Set { name } => commands::theme_set(&config, name).await?.print(),
            }
        }

        Command::Export(export_args) => {
            let config = load(home).await?;
            commands::export(&config, export_args.dir()).await?.print()
        }

        Command::Share => commands::share(&load(home).await?).await?.print(),

        Command::Import(import_args) => {
            let config = load(home).await?;
            let source = import_args
                .source()
                .ok_or_else(|| anyhow::anyhow!("Give either --file or --link"))?;
            commands::import(&config, source, import_args.yes())
                .await?
                .print()
        }
    };
    Ok(())
}

async fn load(home: &Path) -> Result<Config> {
    Config::load(home).await.pub_result(ErrorType::Config)
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={level},finance_planner={level}",
                env!("CARGO_CRATE_NAME"),
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
