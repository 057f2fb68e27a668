use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{FlorinError, Result};
use crate::importer::MAX_REPORTED_ERRORS;
use crate::models::{Category, MerchantMapping};
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Cascade vocabulary
// ---------------------------------------------------------------------------

pub const SALARY_INCOME: &str = "Salary Income";
pub const CREDIT_CARD_PAYMENT: &str = "Credit Card Payment";
pub const TRANSFER: &str = "Transfer";
pub const SELF_TRANSFER: &str = "Self Transfer";
pub const SPLITWISE_SETTLEMENT: &str = "Splitwise Settlement";
pub const INVESTMENT: &str = "Investment";
pub const INVESTMENT_WITHDRAWAL: &str = "Investment Withdrawal";
pub const FOOD_DINING: &str = "Food & Dining";
pub const TRANSPORTATION: &str = "Transportation";
pub const SHOPPING: &str = "Shopping";
pub const BILLS_UTILITIES: &str = "Bills & Utilities";
pub const ENTERTAINMENT: &str = "Entertainment";
pub const HEALTHCARE: &str = "Healthcare";
pub const INCOME: &str = "Income";
pub const REFUND: &str = "Refund";
pub const UNCATEGORIZED_INCOME: &str = "Uncategorized Income";

/// Categories that count as income in reporting.
pub const INCOME_CATEGORIES: &[&str] = &[INCOME, SALARY_INCOME, SPLITWISE_SETTLEMENT];

/// Positive-amount categories that reporting must not treat as income.
pub const INCOME_EXCLUDED_CATEGORIES: &[&str] = &[
    TRANSFER,
    SELF_TRANSFER,
    CREDIT_CARD_PAYMENT,
    INVESTMENT,
    INVESTMENT_WITHDRAWAL,
    REFUND,
    UNCATEGORIZED_INCOME,
];

const CC_PAYMENT_PHRASES: &[&str] = &["credit card", "autopay", "minimum payment", "cc payment"];

const CARD_ISSUERS: &[&str] = &[
    "chase",
    "amex",
    "american express",
    "discover",
    "capital one",
    "citi",
    "barclays",
    "synchrony",
    "apple card",
];

const TRANSFER_KEYWORDS: &[&str] = &["transfer", "tfrfrom", "tfrto", "wire"];

const P2P_BRANDS: &[&str] = &[
    "venmo",
    "cashapp",
    "paypal transfer",
    "apple cash",
    "google pay send",
];

const INVESTMENT_PLATFORMS: &[&str] = &[
    "robinhood",
    "vanguard",
    "fidelity",
    "schwab",
    "etrade",
    "e*trade",
    "webull",
    "coinbase",
    "wealthfront",
    "betterment",
    "acorns",
];

const FOOD_KEYWORDS: &[&str] = &[
    "restaurant",
    "mcdonald",
    "starbucks",
    "chipotle",
    "doordash",
    "grubhub",
    "uber eats",
    "pizza",
    "coffee",
    "grocery",
    "whole foods",
    "trader joe",
];

const TRANSPORT_KEYWORDS: &[&str] = &[
    "uber",
    "lyft",
    "shell",
    "chevron",
    "exxon",
    "gas station",
    "parking",
    "toll",
    "transit",
    "metro",
    "amtrak",
];

const SHOPPING_KEYWORDS: &[&str] = &[
    "amazon",
    "walmart",
    "target",
    "costco",
    "best buy",
    "ebay",
    "etsy",
    "nordstrom",
    "macys",
];

const BILLS_KEYWORDS: &[&str] = &[
    "electric",
    "water bill",
    "internet",
    "comcast",
    "xfinity",
    "verizon",
    "t-mobile",
    "at&t",
    "utility",
    "insurance",
    "rent",
    "mortgage",
    "phone bill",
];

const ENTERTAINMENT_KEYWORDS: &[&str] = &[
    "netflix",
    "spotify",
    "hulu",
    "disney",
    "hbo",
    "cinema",
    "movie",
    "theater",
    "steamgames",
    "playstation",
    "xbox",
    "concert",
];

const HEALTHCARE_KEYWORDS: &[&str] = &[
    "pharmacy",
    "cvs",
    "walgreens",
    "doctor",
    "dental",
    "medical",
    "hospital",
    "clinic",
    "urgent care",
    "optometry",
];

const EXPENSE_GROUPS: &[(&[&str], &str)] = &[
    (FOOD_KEYWORDS, FOOD_DINING),
    (TRANSPORT_KEYWORDS, TRANSPORTATION),
    (SHOPPING_KEYWORDS, SHOPPING),
    (BILLS_KEYWORDS, BILLS_UTILITIES),
    (ENTERTAINMENT_KEYWORDS, ENTERTAINMENT),
    (HEALTHCARE_KEYWORDS, HEALTHCARE),
];

const INCOME_KEYWORDS: &[&str] = &[
    "salary",
    "payroll",
    "wages",
    "direct deposit",
    "employer",
    "freelance",
    "consulting",
    "dividend",
    "interest earned",
    "bonus",
    "commission",
    "tax refund",
    "stimulus",
    "unemployment",
];

const POSITIVE_REFUND_KEYWORDS: &[&str] = &["return", "credit adjustment", "reversal", "correction"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Categorization engine: learned merchant mappings first, then the fixed
/// keyword cascade. Constructed once per process and passed by reference;
/// the mapping cache lives here rather than in module globals so that
/// invalidation is an explicit operation.
pub struct CategoryEngine {
    owner_name: Option<String>,
    employer_name: Option<String>,
    cache: Mutex<HashMap<String, Option<Category>>>,
}

impl CategoryEngine {
    pub fn new(owner_name: Option<&str>, employer_name: Option<&str>) -> CategoryEngine {
        CategoryEngine {
            owner_name: normalize_name(owner_name),
            employer_name: normalize_name(employer_name),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> CategoryEngine {
        CategoryEngine::new(
            Some(settings.owner_name.as_str()),
            Some(settings.employer_name.as_str()),
        )
    }

    /// Total by contract: every description gets a label, with "Shopping"
    /// as the terminal catch-all.
    pub fn categorize(&self, conn: &Connection, description: &str, amount: Option<f64>) -> Category {
        if let Some(mapped) = self.mapping_for(conn, description) {
            return mapped;
        }
        self.cascade(description, amount)
    }

    fn mapping_for(&self, conn: &Connection, description: &str) -> Option<Category> {
        let key = description.to_lowercase();
        if let Some(cached) = self.cache.lock().unwrap().get(&key) {
            return cached.clone();
        }
        let found = match scan_mappings(conn, &key) {
            Ok(found) => found,
            Err(e) => {
                // A broken lookup downgrades to cascade-only, never a failure.
                log::warn!("merchant mapping lookup failed: {e}");
                return None;
            }
        };
        self.cache.lock().unwrap().insert(key, found.clone());
        found
    }

    fn cascade(&self, description: &str, amount: Option<f64>) -> Category {
        let d = description.to_lowercase();
        let positive = amount.map(|a| a > 0.0).unwrap_or(false);

        if let Some(employer) = &self.employer_name {
            if d.contains(employer.as_str()) {
                return Category::new(SALARY_INCOME);
            }
        }

        if d.contains("payment")
            && (contains_any(&d, CC_PAYMENT_PHRASES) || contains_any(&d, CARD_ISSUERS))
        {
            return Category::new(CREDIT_CARD_PAYMENT);
        }

        if contains_any(&d, TRANSFER_KEYWORDS)
            || (d.contains("from") && d.contains("checking"))
            || (d.contains("to") && d.contains("savings"))
        {
            return Category::new(TRANSFER);
        }

        if d.contains("zelle") {
            if let Some(owner) = &self.owner_name {
                if d.contains(owner.as_str()) {
                    return Category::new(SELF_TRANSFER);
                }
            }
            if positive {
                return Category::new(SPLITWISE_SETTLEMENT);
            }
            return Category::new(TRANSFER);
        }
        if contains_any(&d, P2P_BRANDS) {
            return Category::new(TRANSFER);
        }

        if contains_any(&d, INVESTMENT_PLATFORMS) {
            if positive {
                return Category::new(INVESTMENT_WITHDRAWAL);
            }
            return Category::new(INVESTMENT);
        }

        for (keywords, label) in EXPENSE_GROUPS {
            if contains_any(&d, keywords) {
                return Category::new(*label);
            }
        }

        if contains_any(&d, INCOME_KEYWORDS)
            || (d.contains("deposit") && (d.contains("salary") || d.contains("pay")))
        {
            return Category::new(INCOME);
        }

        if d.contains("refund") && !d.contains("tax refund") {
            return Category::new(REFUND);
        }

        if positive {
            if contains_any(&d, POSITIVE_REFUND_KEYWORDS) {
                return Category::new(REFUND);
            }
            return Category::new(UNCATEGORIZED_INCOME);
        }

        Category::new(SHOPPING)
    }

    /// Store a learned description→category mapping and drop the whole
    /// cache; future lookups repopulate it lazily.
    pub fn learn(&self, conn: &Connection, substring: &str, category: &Category) -> Result<()> {
        let substring = substring.trim();
        if substring.is_empty() {
            return Err(FlorinError::Other(
                "mapping substring cannot be empty".to_string(),
            ));
        }
        conn.execute(
            "INSERT INTO merchant_category_mappings (description_substring, category)
             VALUES (?1, ?2)
             ON CONFLICT(description_substring) DO UPDATE SET category = excluded.category",
            rusqlite::params![substring, category],
        )?;
        self.cache.lock().unwrap().clear();
        log::info!("learned mapping {substring:?} -> {category}");
        Ok(())
    }

    /// Manual recategorization of one transaction, which also teaches the
    /// mapping table so future statements with this description pick the
    /// same category. Returns the transaction's description.
    pub fn teach(&self, conn: &Connection, transaction_id: i64, category: &Category) -> Result<String> {
        let description: String = conn
            .query_row(
                "SELECT description FROM transactions WHERE id = ?1",
                [transaction_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                FlorinError::Other(format!("No transaction with id {transaction_id}"))
            })?;
        conn.execute(
            "UPDATE transactions SET category = ?1 WHERE id = ?2",
            rusqlite::params![category, transaction_id],
        )?;
        self.learn(conn, &description, category)?;
        Ok(description)
    }

    /// Re-run the cascade over every transaction in accounts owned by the
    /// user (or shared). Only rows whose category actually changes are
    /// written back.
    pub fn recategorize_all(
        &self,
        conn: &Connection,
        user_id: Option<i64>,
    ) -> Result<RecategorizeOutcome> {
        let mut stmt = conn.prepare(
            "SELECT t.id, t.description, t.amount, t.category
             FROM transactions t
             JOIN accounts a ON a.id = t.account_id
             WHERE a.user_id IS NULL OR a.user_id = ?1
             ORDER BY t.id",
        )?;
        let rows: Vec<(i64, String, f64, Category)> = stmt
            .query_map([user_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut outcome = RecategorizeOutcome::default();
        for (id, description, amount, current) in rows {
            let fresh = self.categorize(conn, &description, Some(amount));
            if fresh == current {
                outcome.unchanged += 1;
                continue;
            }
            match conn.execute(
                "UPDATE transactions SET category = ?1 WHERE id = ?2",
                rusqlite::params![fresh, id],
            ) {
                Ok(_) => outcome.updated += 1,
                Err(e) => {
                    if outcome.errors.len() < MAX_REPORTED_ERRORS {
                        outcome.errors.push(format!("Transaction {id}: {e}"));
                    }
                }
            }
        }
        log::info!(
            "recategorized {} transactions, {} unchanged",
            outcome.updated,
            outcome.unchanged
        );
        Ok(outcome)
    }
}

#[derive(Debug, Default)]
pub struct RecategorizeOutcome {
    pub updated: usize,
    pub unchanged: usize,
    pub errors: Vec<String>,
}

fn normalize_name(name: Option<&str>) -> Option<String> {
    let name = name?.trim().to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Longest stored substring contained in the description wins, so a more
/// specific mapping beats a broader one.
fn scan_mappings(conn: &Connection, lowered_description: &str) -> Result<Option<Category>> {
    let mut stmt = conn.prepare_cached(
        "SELECT description_substring, category FROM merchant_category_mappings
         ORDER BY length(description_substring) DESC, id",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let substring: String = row.get(0)?;
        if lowered_description.contains(&substring.to_lowercase()) {
            return Ok(Some(row.get(1)?));
        }
    }
    Ok(None)
}

pub fn list_mappings(conn: &Connection) -> Result<Vec<MerchantMapping>> {
    let mut stmt = conn.prepare(
        "SELECT id, description_substring, category FROM merchant_category_mappings
         ORDER BY description_substring",
    )?;
    let mappings = stmt
        .query_map([], |row| {
            Ok(MerchantMapping {
                id: row.get(0)?,
                description_substring: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(mappings)
}
