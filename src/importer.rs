use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::categorizer::CategoryEngine;
use crate::error::{FlorinError, Result};
use crate::models::{Account, Category, FileType, ImportRow};
use crate::normalize::{clean_description, round_cents};

/// Per-batch error lists are truncated so a pathological file cannot
/// produce an unbounded report.
pub const MAX_REPORTED_ERRORS: usize = 10;

#[derive(Debug, Default)]
pub struct BatchResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn success(&self) -> bool {
        self.imported > 0
    }

    fn record_error(&mut self, message: String) {
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Account lookup
// ---------------------------------------------------------------------------

/// Accounts owned by the user shadow shared accounts of the same name.
pub fn find_account(conn: &Connection, name: &str, user_id: Option<i64>) -> Result<Account> {
    conn.query_row(
        "SELECT id, user_id, name, kind, balance FROM accounts
         WHERE name = ?1 AND (user_id = ?2 OR user_id IS NULL)
         ORDER BY user_id IS NULL
         LIMIT 1",
        rusqlite::params![name, user_id],
        |row| {
            Ok(Account {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                kind: row.get(3)?,
                balance: row.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| FlorinError::UnknownAccount(name.to_string()))
}

// ---------------------------------------------------------------------------
// Batch import
// ---------------------------------------------------------------------------

/// Row-by-row import into the named account. Each row lands in exactly one
/// outcome: imported, or skipped (missing field, duplicate, error), with
/// failures isolated to their own row. A missing account aborts the batch
/// before any row is touched.
pub fn import_batch(
    conn: &Connection,
    engine: &CategoryEngine,
    account_name: &str,
    user_id: Option<i64>,
    rows: &[ImportRow],
) -> Result<BatchResult> {
    let account = find_account(conn, account_name, user_id)?;
    let mut result = BatchResult::default();

    for (i, row) in rows.iter().enumerate() {
        let fields = match validate_row(row, i + 1) {
            Ok(fields) => fields,
            Err(message) => {
                result.skipped += 1;
                result.record_error(message);
                continue;
            }
        };

        match is_duplicate_row(conn, account.id, &fields) {
            // Re-uploading a statement is expected, so duplicates skip
            // silently rather than counting as errors.
            Ok(true) => {
                result.skipped += 1;
                log::debug!("skipping duplicate row: {} {}", fields.date, fields.description);
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                result.skipped += 1;
                result.record_error(format!("Row {}: {e}", i + 1));
                continue;
            }
        }

        match insert_row(conn, engine, &account, user_id, &fields) {
            Ok(()) => result.imported += 1,
            Err(e) => {
                result.skipped += 1;
                result.record_error(format!("Row {}: {e}", i + 1));
            }
        }
    }

    log::info!(
        "imported {} rows into {account_name:?}, skipped {}",
        result.imported,
        result.skipped
    );
    Ok(result)
}

struct RowFields {
    date: String,
    description: String,
    amount: f64,
    category: Category,
}

fn validate_row(row: &ImportRow, index: usize) -> std::result::Result<RowFields, String> {
    let mut missing = Vec::new();

    let date = match row.date.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => Some(d.to_string()),
        _ => {
            missing.push("date");
            None
        }
    };
    let description = match row.description.as_deref().map(clean_description) {
        Some(d) if !d.is_empty() => Some(d),
        _ => {
            missing.push("description");
            None
        }
    };
    let amount = match row.amount {
        Some(a) if a.is_finite() => Some(round_cents(a)),
        _ => {
            missing.push("amount");
            None
        }
    };
    let category = match &row.category {
        Some(c) => Some(c.clone()),
        None => {
            missing.push("category");
            None
        }
    };

    if let (Some(date), Some(description), Some(amount), Some(category)) =
        (date, description, amount, category)
    {
        return Ok(RowFields {
            date,
            description,
            amount,
            category,
        });
    }
    Err(format!("Row {index}: missing {}", missing.join(", ")))
}

fn is_duplicate_row(conn: &Connection, account_id: i64, fields: &RowFields) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT EXISTS(
            SELECT 1 FROM transactions
            WHERE account_id = ?1 AND date = ?2 AND description = ?3 AND amount = ?4
        )",
    )?;
    let exists: bool = stmt.query_row(
        rusqlite::params![account_id, fields.date, fields.description, fields.amount],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// The insert plus its balance and budget side effects commit or roll back
/// as one unit, so a failed row leaves no partial state behind.
fn insert_row(
    conn: &Connection,
    engine: &CategoryEngine,
    account: &Account,
    user_id: Option<i64>,
    fields: &RowFields,
) -> Result<()> {
    conn.execute_batch("SAVEPOINT import_row")?;
    match insert_row_inner(conn, engine, account, user_id, fields) {
        Ok(()) => {
            conn.execute_batch("RELEASE import_row")?;
            Ok(())
        }
        Err(e) => {
            conn.execute_batch("ROLLBACK TO import_row; RELEASE import_row")?;
            Err(e)
        }
    }
}

fn insert_row_inner(
    conn: &Connection,
    engine: &CategoryEngine,
    account: &Account,
    user_id: Option<i64>,
    fields: &RowFields,
) -> Result<()> {
    let category = if fields.category.is_unknown() {
        engine.categorize(conn, &fields.description, Some(fields.amount))
    } else {
        fields.category.clone()
    };

    conn.execute(
        "INSERT INTO transactions (account_id, date, description, amount, category)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![account.id, fields.date, fields.description, fields.amount, category],
    )?;
    conn.execute(
        "UPDATE accounts SET balance = balance + ?1 WHERE id = ?2",
        rusqlite::params![fields.amount, account.id],
    )?;
    if fields.amount < 0.0 {
        apply_budget_outflow(conn, user_id, &category, -fields.amount)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Budget side effects
// ---------------------------------------------------------------------------

/// Outflow is a positive magnitude. Only spending touches budgets; inflows
/// and categories without a budget row are left alone.
fn apply_budget_outflow(
    conn: &Connection,
    user_id: Option<i64>,
    category: &Category,
    outflow: f64,
) -> Result<()> {
    let Some(budget_id) = find_budget(conn, user_id, category)? else {
        return Ok(());
    };
    conn.execute(
        "UPDATE budgets SET spent = spent + ?1, remaining = budgeted - (spent + ?1)
         WHERE id = ?2",
        rusqlite::params![outflow, budget_id],
    )?;
    Ok(())
}

/// The user's own budget row wins over a shared one for the same category.
fn find_budget(conn: &Connection, user_id: Option<i64>, category: &Category) -> Result<Option<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM budgets
         WHERE category = ?1 AND (user_id = ?2 OR user_id IS NULL)
         ORDER BY user_id IS NULL
         LIMIT 1",
    )?;
    let id = stmt
        .query_row(rusqlite::params![category, user_id], |row| row.get(0))
        .optional()?;
    Ok(id)
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Remove a transaction and undo its balance and budget effects. Budget
/// reversal targets the account owner's budget row, matching where the
/// outflow landed at import time.
pub fn delete_transaction(conn: &Connection, transaction_id: i64) -> Result<()> {
    let row = conn
        .query_row(
            "SELECT t.account_id, t.amount, t.category, a.user_id
             FROM transactions t
             JOIN accounts a ON a.id = t.account_id
             WHERE t.id = ?1",
            [transaction_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, Category>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((account_id, amount, category, user_id)) = row else {
        return Err(FlorinError::Other(format!(
            "No transaction with id {transaction_id}"
        )));
    };

    conn.execute_batch("SAVEPOINT delete_txn")?;
    let outcome = delete_transaction_inner(conn, transaction_id, account_id, amount, &category, user_id);
    match outcome {
        Ok(()) => {
            conn.execute_batch("RELEASE delete_txn")?;
            Ok(())
        }
        Err(e) => {
            conn.execute_batch("ROLLBACK TO delete_txn; RELEASE delete_txn")?;
            Err(e)
        }
    }
}

fn delete_transaction_inner(
    conn: &Connection,
    transaction_id: i64,
    account_id: i64,
    amount: f64,
    category: &Category,
    user_id: Option<i64>,
) -> Result<()> {
    conn.execute("DELETE FROM transactions WHERE id = ?1", [transaction_id])?;
    conn.execute(
        "UPDATE accounts SET balance = balance - ?1 WHERE id = ?2",
        rusqlite::params![amount, account_id],
    )?;
    if amount < 0.0 {
        if let Some(budget_id) = find_budget(conn, user_id, category)? {
            conn.execute(
                "UPDATE budgets SET spent = spent - ?1, remaining = budgeted - (spent - ?1)
                 WHERE id = ?2",
                rusqlite::params![-amount, budget_id],
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Statement audit trail
// ---------------------------------------------------------------------------

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Returns the filename of a prior import of the same bytes into this
/// account, if any. The same statement may still be loaded into other
/// accounts.
pub fn previously_imported(
    conn: &Connection,
    account_id: i64,
    checksum: &str,
) -> Result<Option<String>> {
    let filename = conn
        .query_row(
            "SELECT filename FROM statement_imports
             WHERE checksum = ?1 AND account_id = ?2
             ORDER BY id LIMIT 1",
            rusqlite::params![checksum, account_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(filename)
}

pub fn record_statement_import(
    conn: &Connection,
    account_id: i64,
    filename: &str,
    file_type: FileType,
    file_size: usize,
    checksum: &str,
    result: &BatchResult,
) -> Result<()> {
    conn.execute(
        "INSERT INTO statement_imports
            (account_id, filename, file_type, file_size, checksum, imported_count, skipped_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            account_id,
            filename,
            file_type.as_str(),
            file_size as i64,
            checksum,
            result.imported as i64,
            result.skipped as i64,
        ],
    )?;
    Ok(())
}
