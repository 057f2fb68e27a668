use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    user_id INTEGER,
    name TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'checking',
    balance REAL NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    category TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_account_date
    ON transactions(account_id, date, amount);

CREATE TABLE IF NOT EXISTS budgets (
    id INTEGER PRIMARY KEY,
    user_id INTEGER,
    category TEXT NOT NULL,
    budgeted REAL NOT NULL DEFAULT 0,
    spent REAL NOT NULL DEFAULT 0,
    remaining REAL NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY,
    user_id INTEGER,
    name TEXT NOT NULL,
    target_amount REAL NOT NULL DEFAULT 0,
    saved_amount REAL NOT NULL DEFAULT 0,
    target_date TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS merchant_category_mappings (
    id INTEGER PRIMARY KEY,
    description_substring TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS statement_imports (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    file_type TEXT,
    file_size INTEGER,
    checksum TEXT,
    imported_count INTEGER DEFAULT 0,
    skipped_count INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT
);
";

const SCHEMA_VERSION: &str = "1";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    if get_metadata(conn, "schema_version")?.is_none() {
        set_metadata(conn, "schema_version", SCHEMA_VERSION)?;
    }
    Ok(())
}

/// Categories every fresh database starts with so imports track spending
/// before the user sets any amounts.
pub const DEFAULT_BUDGET_CATEGORIES: &[&str] = &[
    crate::categorizer::FOOD_DINING,
    crate::categorizer::TRANSPORTATION,
    crate::categorizer::SHOPPING,
    crate::categorizer::BILLS_UTILITIES,
    crate::categorizer::ENTERTAINMENT,
    crate::categorizer::HEALTHCARE,
];

/// No-op unless the budgets table is empty, so re-running init never
/// clobbers user amounts.
pub fn seed_default_budgets(conn: &Connection) -> Result<usize> {
    let existing: i64 = conn.query_row("SELECT count(*) FROM budgets", [], |r| r.get(0))?;
    if existing > 0 {
        return Ok(0);
    }
    let mut inserted = 0;
    for category in DEFAULT_BUDGET_CATEGORIES {
        inserted += conn.execute(
            "INSERT INTO budgets (user_id, category, budgeted, spent, remaining)
             VALUES (NULL, ?1, 0, 0, 0)",
            [category],
        )?;
    }
    Ok(inserted)
}

pub fn get_metadata(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}
