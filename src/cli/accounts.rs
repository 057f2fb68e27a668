use std::path::Path;

use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::{FlorinError, Result};
use crate::fmt::money_colored;

const ACCOUNT_KINDS: &[&str] = &["checking", "credit_card", "savings", "other"];

pub fn add(
    data_dir: &Path,
    name: &str,
    kind: &str,
    balance: f64,
    user: Option<i64>,
) -> Result<()> {
    if !ACCOUNT_KINDS.contains(&kind) {
        return Err(FlorinError::Other(format!(
            "Unknown account kind {kind:?} (expected one of: {})",
            ACCOUNT_KINDS.join(", ")
        )));
    }
    let conn = open_db(data_dir)?;
    conn.execute(
        "INSERT INTO accounts (user_id, name, kind, balance) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user, name, kind, balance],
    )?;
    println!("Added account: {name}");
    Ok(())
}

pub fn list(data_dir: &Path) -> Result<()> {
    let conn = open_db(data_dir)?;
    let mut stmt =
        conn.prepare("SELECT id, name, kind, user_id, balance FROM accounts ORDER BY name")?;
    let rows: Vec<(i64, String, String, Option<i64>, f64)> = stmt
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
    table.set_header(vec!["ID", "Name", "Kind", "Owner", "Balance"]);
    for (id, name, kind, user_id, balance) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(kind),
            Cell::new(user_id.map(|u| u.to_string()).unwrap_or_else(|| "shared".to_string())),
            Cell::new(money_colored(balance)),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}

pub fn delete(data_dir: &Path, id: i64) -> Result<()> {
    let conn = open_db(data_dir)?;
    let transactions: i64 = conn.query_row(
        "SELECT count(*) FROM transactions WHERE account_id = ?1",
        [id],
        |r| r.get(0),
    )?;
    if transactions > 0 {
        return Err(FlorinError::Other(format!(
            "Account {id} still has {transactions} transactions; delete those first"
        )));
    }
    let removed = conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
    if removed == 0 {
        return Err(FlorinError::Other(format!("No account with id {id}")));
    }
    println!("Deleted account {id}");
    Ok(())
}
