use std::path::Path;

use comfy_table::{Cell, Table};
use rusqlite::ToSql;

use crate::categorizer::CategoryEngine;
use crate::cli::open_db;
use crate::error::{FlorinError, Result};
use crate::fmt::money_colored;
use crate::importer::delete_transaction;
use crate::models::Category;
use crate::settings::load_settings;

pub fn list(
    data_dir: &Path,
    account: Option<&str>,
    category: Option<&str>,
    limit: usize,
) -> Result<()> {
    let conn = open_db(data_dir)?;

    let mut sql = String::from(
        "SELECT t.id, t.date, t.description, t.amount, t.category, a.name
         FROM transactions t
         JOIN accounts a ON a.id = t.account_id",
    );
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();
    if let Some(account) = &account {
        clauses.push(format!("a.name = ?{}", params.len() + 1));
        params.push(account);
    }
    if let Some(category) = &category {
        clauses.push(format!("t.category = ?{}", params.len() + 1));
        params.push(category);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    let limit = limit as i64;
    sql.push_str(&format!(" ORDER BY t.date DESC, t.id DESC LIMIT ?{}", params.len() + 1));
    params.push(&limit);

    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<(i64, String, String, f64, String, String)> = stmt
        .query_map(&params[..], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Category", "Account"]);
    for (id, date, description, amount, cat, acct) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(date),
            Cell::new(description),
            Cell::new(money_colored(amount)),
            Cell::new(cat),
            Cell::new(acct),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn delete(data_dir: &Path, id: i64) -> Result<()> {
    let conn = open_db(data_dir)?;
    delete_transaction(&conn, id)?;
    println!("Deleted transaction {id} and reversed its balance and budget effects");
    Ok(())
}

pub fn set_category(data_dir: &Path, id: i64, category: &str) -> Result<()> {
    let category = Category::new(category);
    if category.is_unknown() {
        return Err(FlorinError::Other("Category cannot be empty".to_string()));
    }
    let conn = open_db(data_dir)?;
    let engine = CategoryEngine::from_settings(&load_settings());
    let description = engine.teach(&conn, id, &category)?;
    println!("Transaction {id} ({description}) set to {category}");
    println!("Future statements matching that description will use {category}");
    Ok(())
}
