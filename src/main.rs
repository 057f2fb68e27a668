mod categorizer;
mod cli;
mod db;
mod error;
mod extract;
mod fmt;
mod importer;
mod models;
mod normalize;
mod settings;

use std::path::PathBuf;

use clap::Parser;

use cli::{
    AccountsCommands, BudgetsCommands, Cli, Commands, GoalsCommands, MappingsCommands,
    TransactionsCommands,
};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let data_dir: PathBuf = match &cli.data_dir {
        Some(dir) => PathBuf::from(settings::shellexpand_path(dir)),
        None => settings::get_data_dir(),
    };

    let result = match cli.command {
        Commands::Init { owner, employer } => {
            cli::init::run(&data_dir, owner.as_deref(), employer.as_deref())
        }
        Commands::Status => cli::status::run(&data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                kind,
                balance,
                user,
            } => cli::accounts::add(&data_dir, &name, &kind, balance, user),
            AccountsCommands::List => cli::accounts::list(&data_dir),
            AccountsCommands::Delete { id } => cli::accounts::delete(&data_dir, id),
        },
        Commands::Budgets { command } => match command {
            BudgetsCommands::Set {
                category,
                amount,
                user,
            } => cli::budgets::set(&data_dir, &category, amount, user),
            BudgetsCommands::List => cli::budgets::list(&data_dir),
        },
        Commands::Goals { command } => match command {
            GoalsCommands::Add {
                name,
                target,
                saved,
                target_date,
                user,
            } => cli::goals::add(&data_dir, &name, target, saved, target_date.as_deref(), user),
            GoalsCommands::List => cli::goals::list(&data_dir),
        },
        Commands::Preview { file, json } => cli::preview::run(&data_dir, &file, json),
        Commands::Import {
            file,
            account,
            user,
        } => cli::import::run(&data_dir, &file, &account, user),
        Commands::Transactions { command } => match command {
            TransactionsCommands::List {
                account,
                category,
                limit,
            } => cli::transactions::list(&data_dir, account.as_deref(), category.as_deref(), limit),
            TransactionsCommands::Delete { id } => cli::transactions::delete(&data_dir, id),
            TransactionsCommands::SetCategory { id, category } => {
                cli::transactions::set_category(&data_dir, id, &category)
            }
        },
        Commands::Mappings { command } => match command {
            MappingsCommands::Learn {
                substring,
                category,
            } => cli::mappings::learn(&data_dir, &substring, &category),
            MappingsCommands::List => cli::mappings::list(&data_dir),
        },
        Commands::Categorize { user } => cli::categorize::run(&data_dir, user),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
