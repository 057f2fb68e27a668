use std::path::Path;

use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::fmt::money;

pub fn add(
    data_dir: &Path,
    name: &str,
    target: f64,
    saved: f64,
    target_date: Option<&str>,
    user: Option<i64>,
) -> Result<()> {
    let conn = open_db(data_dir)?;
    conn.execute(
        "INSERT INTO goals (user_id, name, target_amount, saved_amount, target_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![user, name, target, saved, target_date],
    )?;
    println!("Added goal: {name} ({})", money(target));
    Ok(())
}

pub fn list(data_dir: &Path) -> Result<()> {
    let conn = open_db(data_dir)?;
    let mut stmt = conn.prepare(
        "SELECT id, name, target_amount, saved_amount, target_date FROM goals ORDER BY name",
    )?;
    let rows: Vec<(i64, String, f64, f64, Option<String>)> = stmt
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
    table.set_header(vec!["ID", "Name", "Target", "Saved", "Progress", "By"]);
    for (id, name, target, saved, by) in rows {
        let progress = if target > 0.0 { saved / target * 100.0 } else { 0.0 };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(money(target)),
            Cell::new(money(saved)),
            Cell::new(format!("{progress:.0}%")),
            Cell::new(by.unwrap_or_default()),
        ]);
    }
    println!("Goals\n{table}");
    Ok(())
}
