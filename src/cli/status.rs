use std::path::Path;

use crate::cli::{open_db, DB_FILE};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run(data_dir: &Path) -> Result<()> {
    let settings = load_settings();
    let db_path = data_dir.join(DB_FILE);

    println!(
        "Owner:      {}",
        if settings.owner_name.is_empty() { "(not set)" } else { &settings.owner_name }
    );
    println!(
        "Employer:   {}",
        if settings.employer_name.is_empty() { "(not set)" } else { &settings.employer_name }
    );
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = open_db(data_dir)?;
        let accounts: i64 = conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?;
        let transactions: i64 =
            conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let budgets: i64 = conn.query_row("SELECT count(*) FROM budgets", [], |r| r.get(0))?;
        let goals: i64 = conn.query_row("SELECT count(*) FROM goals", [], |r| r.get(0))?;
        let mappings: i64 = conn.query_row(
            "SELECT count(*) FROM merchant_category_mappings",
            [],
            |r| r.get(0),
        )?;
        let statements: i64 =
            conn.query_row("SELECT count(*) FROM statement_imports", [], |r| r.get(0))?;

        println!();
        println!("Accounts:      {accounts}");
        println!("Transactions:  {transactions}");
        println!("Budgets:       {budgets}");
        println!("Goals:         {goals}");
        println!("Mappings:      {mappings}");
        println!("Statements:    {statements}");
    } else {
        println!();
        println!("Database not found. Run `florin init` to set up.");
    }

    Ok(())
}
