use std::path::Path;

use colored::Colorize;

use crate::categorizer::CategoryEngine;
use crate::cli::open_db;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run(data_dir: &Path, user: Option<i64>) -> Result<()> {
    let conn = open_db(data_dir)?;
    let engine = CategoryEngine::from_settings(&load_settings());
    let outcome = engine.recategorize_all(&conn, user)?;
    println!(
        "{}",
        format!("{} recategorized, {} unchanged", outcome.updated, outcome.unchanged).green()
    );
    for error in &outcome.errors {
        println!("  {}", error.red());
    }
    Ok(())
}
