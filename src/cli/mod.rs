pub mod accounts;
pub mod budgets;
pub mod categorize;
pub mod goals;
pub mod import;
pub mod init;
pub mod mappings;
pub mod preview;
pub mod status;
pub mod transactions;

use std::path::Path;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{FlorinError, Result};

pub(crate) const DB_FILE: &str = "florin.db";

pub(crate) fn open_db(data_dir: &Path) -> Result<Connection> {
    let db_path = data_dir.join(DB_FILE);
    if !db_path.exists() {
        return Err(FlorinError::Other(format!(
            "No database at {}. Run `florin init` first.",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

#[derive(Parser)]
#[command(
    name = "florin",
    about = "Personal finance CLI: import bank statements, categorize spending, track budgets."
)]
pub struct Cli {
    /// Data directory (default: from settings; `florin init` sets it)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Florin: create the data directory and initialize the database.
    Init {
        /// Account holder's name as it appears in Zelle/P2P descriptions
        #[arg(long)]
        owner: Option<String>,
        /// Employer name as printed on payroll deposits
        #[arg(long)]
        employer: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage budgets.
    Budgets {
        #[command(subcommand)]
        command: BudgetsCommands,
    },
    /// Manage savings goals.
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Parse a statement and show what would be imported, without writing.
    Preview {
        /// Path to a PDF or CSV statement
        file: String,
        /// Emit the parsed rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Parse a statement and import its transactions into an account.
    Import {
        /// Path to a PDF or CSV statement
        file: String,
        /// Account name to import into
        #[arg(long)]
        account: String,
        /// Owning user id (default: shared accounts only)
        #[arg(long)]
        user: Option<i64>,
    },
    /// List, relabel, or delete transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Manage learned merchant-category mappings.
    Mappings {
        #[command(subcommand)]
        command: MappingsCommands,
    },
    /// Re-run categorization across stored transactions.
    Categorize {
        /// Limit to accounts owned by this user id (shared accounts included)
        #[arg(long)]
        user: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Chase Checking'
        name: String,
        /// Account kind: checking, credit_card, savings, other
        #[arg(long, default_value = "checking")]
        kind: String,
        /// Opening balance
        #[arg(long, default_value = "0.0")]
        balance: f64,
        /// Owning user id (default: shared)
        #[arg(long)]
        user: Option<i64>,
    },
    /// List all accounts.
    List,
    /// Delete an account that has no transactions.
    Delete {
        /// Account ID (shown in `florin accounts list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetsCommands {
    /// Set the budgeted amount for a category.
    Set {
        /// Category name, e.g. 'Food & Dining'
        category: String,
        /// Budgeted amount
        amount: f64,
        /// Owning user id (default: shared)
        #[arg(long)]
        user: Option<i64>,
    },
    /// List budgets with spent and remaining amounts.
    List,
}

#[derive(Subcommand)]
pub enum GoalsCommands {
    /// Add a savings goal.
    Add {
        /// Goal name, e.g. 'Emergency fund'
        name: String,
        /// Target amount
        #[arg(long)]
        target: f64,
        /// Amount already saved
        #[arg(long, default_value = "0.0")]
        saved: f64,
        /// Target date: YYYY-MM-DD
        #[arg(long = "date")]
        target_date: Option<String>,
        /// Owning user id (default: shared)
        #[arg(long)]
        user: Option<i64>,
    },
    /// List savings goals.
    List,
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List transactions, most recent first.
    List {
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Maximum rows to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Delete a transaction and undo its balance and budget effects.
    Delete {
        /// Transaction ID (shown in `florin transactions list`)
        id: i64,
    },
    /// Reassign a transaction's category and learn the mapping.
    SetCategory {
        /// Transaction ID
        id: i64,
        /// New category name
        category: String,
    },
}

#[derive(Subcommand)]
pub enum MappingsCommands {
    /// Teach a description-substring to category mapping.
    Learn {
        /// Substring matched case-insensitively against descriptions
        substring: String,
        /// Category to assign
        category: String,
    },
    /// List learned mappings.
    List,
}
