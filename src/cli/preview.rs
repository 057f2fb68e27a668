use std::path::Path;

use comfy_table::{Cell, Table};

use crate::categorizer::CategoryEngine;
use crate::cli::open_db;
use crate::error::{FlorinError, Result};
use crate::extract::process_statement;
use crate::fmt::money_colored;
use crate::settings::load_settings;

pub fn run(data_dir: &Path, file: &str, json: bool) -> Result<()> {
    let conn = open_db(data_dir)?;
    let engine = CategoryEngine::from_settings(&load_settings());

    let path = Path::new(file);
    let data = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    let statement = process_statement(&conn, &engine, &data, &file_name, "")?;

    if json {
        let payload = serde_json::to_string_pretty(&statement)
            .map_err(|e| FlorinError::Other(e.to_string()))?;
        println!("{payload}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Category"]);
    for tx in &statement.transactions {
        table.add_row(vec![
            Cell::new(&tx.date),
            Cell::new(&tx.description),
            Cell::new(money_colored(tx.amount)),
            Cell::new(tx.category.to_string()),
        ]);
    }
    println!(
        "{} ({} transactions)\n{table}",
        statement.file_name, statement.total_count
    );
    println!("Run `florin import {file} --account <name>` to save these.");
    Ok(())
}
