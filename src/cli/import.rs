use std::path::Path;

use colored::Colorize;

use crate::categorizer::CategoryEngine;
use crate::cli::open_db;
use crate::error::Result;
use crate::extract::process_statement;
use crate::importer::{
    compute_checksum, find_account, import_batch, previously_imported, record_statement_import,
};
use crate::models::ImportRow;
use crate::settings::load_settings;

pub fn run(data_dir: &Path, file: &str, account: &str, user: Option<i64>) -> Result<()> {
    let conn = open_db(data_dir)?;
    let engine = CategoryEngine::from_settings(&load_settings());

    let path = Path::new(file);
    let data = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    // Fail on a missing account before doing any parsing work.
    let target = find_account(&conn, account, user)?;

    let checksum = compute_checksum(&data);
    if let Some(previous) = previously_imported(&conn, target.id, &checksum)? {
        println!("This file has already been imported as {previous} (matching checksum).");
        return Ok(());
    }

    let statement = process_statement(&conn, &engine, &data, &file_name, "")?;
    let rows: Vec<ImportRow> = statement
        .transactions
        .iter()
        .cloned()
        .map(ImportRow::from)
        .collect();

    let result = import_batch(&conn, &engine, account, user, &rows)?;
    record_statement_import(
        &conn,
        target.id,
        &statement.file_name,
        statement.file_type,
        data.len(),
        &checksum,
        &result,
    )?;

    let summary = format!(
        "{} imported, {} skipped into {account}",
        result.imported, result.skipped
    );
    if result.success() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
    for error in &result.errors {
        println!("  {}", error.red());
    }
    Ok(())
}
