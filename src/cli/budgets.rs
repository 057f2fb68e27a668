use std::path::Path;

use comfy_table::{Cell, Table};
use rusqlite::OptionalExtension;

use crate::cli::open_db;
use crate::error::{FlorinError, Result};
use crate::fmt::{money, money_colored};
use crate::models::Category;

pub fn set(data_dir: &Path, category: &str, amount: f64, user: Option<i64>) -> Result<()> {
    let category = Category::new(category);
    if category.is_unknown() {
        return Err(FlorinError::Other("Category cannot be empty".to_string()));
    }
    let conn = open_db(data_dir)?;

    // NULL user ids never collide under a UNIQUE index, so upsert by hand.
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM budgets WHERE category = ?1 AND user_id IS ?2",
            rusqlite::params![category, user],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE budgets SET budgeted = ?1, remaining = ?1 - spent WHERE id = ?2",
                rusqlite::params![amount, id],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO budgets (user_id, category, budgeted, spent, remaining)
                 VALUES (?1, ?2, ?3, 0, ?3)",
                rusqlite::params![user, category, amount],
            )?;
        }
    }
    println!("Budget for {category}: {}", money(amount));
    Ok(())
}

pub fn list(data_dir: &Path) -> Result<()> {
    let conn = open_db(data_dir)?;
    let mut stmt = conn.prepare(
        "SELECT category, user_id, budgeted, spent, remaining FROM budgets
         ORDER BY category, user_id IS NULL",
    )?;
    let rows: Vec<(String, Option<i64>, f64, f64, f64)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Owner", "Budgeted", "Spent", "Remaining"]);
    for (category, user_id, budgeted, spent, remaining) in rows {
        table.add_row(vec![
            Cell::new(category),
            Cell::new(user_id.map(|u| u.to_string()).unwrap_or_else(|| "shared".to_string())),
            Cell::new(money(budgeted)),
            Cell::new(money(spent)),
            Cell::new(money_colored(remaining)),
        ]);
    }
    println!("Budgets\n{table}");
    Ok(())
}
