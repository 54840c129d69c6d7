//! These structs provide the CLI interface for the finplan CLI.

use crate::config::DEFAULT_SHARE_BASE_URL;
use crate::model::{Amount, Category};
use clap::{Args as ClapArgs, Parser, Subcommand};
use rust_decimal::Decimal;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finplan: A local-first personal finance planner.
///
/// Track expenses, loans, your monthly salary and side incomes in a small local database, see a
/// summary of where the money goes, and move everything between machines as a snapshot file or a
/// share link.
#[derive(Debug, Parser, Clone)]
#[command(name = "finplan", version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory, its configuration file and an empty database.
    ///
    /// This is the first command you should run. By default the home directory is
    /// $HOME/finance-planner; pass --home or set FINPLAN_HOME to put it somewhere else.
    Init(InitArgs),
    /// Show income, spending by category, savings rate and recent activity.
    Summary,
    /// Add, list, change or remove expenses.
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Add, list, change or remove loans.
    #[command(subcommand)]
    Loan(LoanCommand),
    /// Show or set the monthly salary.
    #[command(subcommand)]
    Salary(SalaryCommand),
    /// Add, list or remove additional income sources.
    #[command(subcommand)]
    SideIncome(SideIncomeCommand),
    /// Show or set the theme.
    #[command(subcommand)]
    Theme(ThemeCommand),
    /// Write all data to a JSON snapshot file.
    Export(ExportArgs),
    /// Print a link that carries all data in its `data` parameter.
    Share,
    /// Load a snapshot from a file or a share link, replacing the stored values it contains.
    Import(ImportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the planner's data and configuration are held. Defaults to
    /// ~/finance-planner
    #[arg(long, env = "FINPLAN_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `finplan init` command.
#[derive(Debug, ClapArgs, Clone)]
pub struct InitArgs {
    /// The address of the planner that share links should open.
    #[arg(long, default_value = DEFAULT_SHARE_BASE_URL)]
    share_url: String,
}

impl InitArgs {
    pub fn new(share_url: impl Into<String>) -> Self {
        Self {
            share_url: share_url.into(),
        }
    }

    pub fn share_url(&self) -> &str {
        &self.share_url
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExpenseCommand {
    /// Record a new expense.
    Add(ExpenseArgs),
    /// List all expenses.
    List,
    /// Change an expense. Fields that are not given keep their current value.
    Update(ExpenseUpdateArgs),
    /// Remove an expense.
    Delete(IdArgs),
}

/// (Not shown): Args for `finplan expense add`.
#[derive(Debug, ClapArgs, Clone)]
pub struct ExpenseArgs {
    /// What the money was spent on.
    #[arg(long)]
    pub description: String,

    /// The amount spent, e.g. 250.50
    #[arg(long)]
    pub amount: Amount,

    /// One of Food, Transportation, Housing, Utilities, Loans, Other.
    #[arg(long, default_value = "Other")]
    pub category: Category,

    /// The date in YYYY-MM-DD format. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long, default_value = "")]
    pub notes: String,
}

/// (Not shown): Args for `finplan expense update`.
#[derive(Debug, ClapArgs, Clone)]
pub struct ExpenseUpdateArgs {
    /// The id of the expense, as shown by `finplan expense list`.
    pub id: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub amount: Option<Amount>,

    #[arg(long)]
    pub category: Option<Category>,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum LoanCommand {
    /// Record a new loan.
    Add(LoanArgs),
    /// List all loans.
    List,
    /// Change a loan. Fields that are not given keep their current value.
    Update(LoanUpdateArgs),
    /// Remove a loan.
    Delete(IdArgs),
}

/// (Not shown): Args for `finplan loan add`.
#[derive(Debug, ClapArgs, Clone)]
pub struct LoanArgs {
    /// A name for the loan, e.g. Car
    #[arg(long, default_value = "")]
    pub name: String,

    /// The principal amount.
    #[arg(long)]
    pub amount: Amount,

    /// The yearly interest rate in percent.
    #[arg(long)]
    pub interest_rate: Option<Amount>,

    /// The start date in YYYY-MM-DD format. Defaults to today.
    #[arg(long)]
    pub start_date: Option<String>,
}

/// (Not shown): Args for `finplan loan update`.
#[derive(Debug, ClapArgs, Clone)]
pub struct LoanUpdateArgs {
    /// The id of the loan, as shown by `finplan loan list`.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub amount: Option<Amount>,

    #[arg(long)]
    pub interest_rate: Option<Amount>,

    #[arg(long)]
    pub start_date: Option<String>,
}

/// (Not shown): Args for commands that take a record id.
#[derive(Debug, ClapArgs, Clone)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SalaryCommand {
    /// Print the monthly salary and the total income.
    Show,
    /// Set the monthly salary. The total income is recomputed.
    Set {
        /// The monthly salary, zero or more.
        amount: Decimal,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SideIncomeCommand {
    /// Add an income source. The total income is recomputed.
    Add {
        #[arg(long)]
        amount: Amount,

        /// Where the income comes from, e.g. Tutoring
        #[arg(long, default_value = "")]
        source: String,
    },
    /// List income sources with their positions.
    List,
    /// Remove the income source at a position shown by `finplan side-income list`.
    Remove {
        /// The position, starting at 1.
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        position: u32,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommand {
    Show,
    Set { name: String },
}

/// (Not shown): Args for `finplan export`.
#[derive(Debug, ClapArgs, Clone)]
pub struct ExportArgs {
    /// The directory to write the snapshot file into. Defaults to the current directory.
    #[arg(long, default_value = ".")]
    dir: PathBuf,
}

impl ExportArgs {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// (Not shown): Args for `finplan import`.
#[derive(Debug, ClapArgs, Clone)]
pub struct ImportArgs {
    /// A snapshot file written by `finplan export`, or a backup.
    #[arg(long, conflicts_with = "link", required_unless_present = "link")]
    file: Option<PathBuf>,

    /// A link printed by `finplan share`.
    #[arg(long)]
    link: Option<String>,

    /// Apply the import without asking for confirmation.
    #[arg(long, short = 'y')]
    yes: bool,
}

/// Where an import comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    File(PathBuf),
    Link(String),
}

impl ImportArgs {
    pub fn new(source: ImportSource, yes: bool) -> Self {
        let (file, link) = match source {
            ImportSource::File(path) => (Some(path), None),
            ImportSource::Link(link) => (None, Some(link)),
        };
        Self { file, link, yes }
    }

    pub fn source(&self) -> Option<ImportSource> {
        match (&self.file, &self.link) {
            (Some(path), _) => Some(ImportSource::File(path.clone())),
            (None, Some(link)) => Some(ImportSource::Link(link.clone())),
            (None, None) => None,
        }
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finance-planner"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or FINPLAN_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("finance-planner")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
