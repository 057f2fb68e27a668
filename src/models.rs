use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Category label stored on transactions, budgets, and merchant mappings.
///
/// Construction trims whitespace and caps the label at 100 characters, so
/// every label that reaches the database is already in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Category {
        let name = name.into();
        Category(name.trim().chars().take(100).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for labels that should be (re)derived by the category engine:
    /// empty, whitespace-only, or the literal placeholder "Unknown".
    pub fn is_unknown(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Category {
        Category::new(name)
    }
}

impl From<String> for Category {
    fn from(name: String) -> Category {
        Category::new(name)
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Category::new)
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub kind: String,
    pub balance: f64,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: Category,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Budget {
    pub id: i64,
    pub user_id: Option<i64>,
    pub category: Category,
    pub budgeted: f64,
    pub spent: f64,
    pub remaining: f64,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Goal {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
    pub target_date: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct MerchantMapping {
    pub id: i64,
    pub description_substring: String,
    pub category: Category,
}

/// Direction marker a statement layout attaches to a row before the amount
/// text is parsed. A `Debit` hint forces the final amount negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Debit,
    Credit,
}

/// Raw field text lifted from one statement line or CSV record, before any
/// date or amount normalization.
#[derive(Debug, Clone)]
pub struct RawTransaction {
    pub date_text: String,
    pub description_text: String,
    pub amount_text: String,
    pub type_hint: Option<TypeHint>,
}

/// Intermediate representation after date/amount normalization, before
/// categorization.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub date: String,
    pub description: String,
    pub amount: f64,
}

/// One normalized, categorized row as shown in a statement preview.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedTransaction {
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Csv,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Csv => "csv",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything extracted from one statement file.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedStatement {
    pub file_name: String,
    pub file_type: FileType,
    pub total_count: usize,
    pub transactions: Vec<ParsedTransaction>,
}

/// One row submitted to the batch importer. Fields are optional because
/// callers may hand over partially extracted data; the importer decides
/// per row whether enough is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl From<ParsedTransaction> for ImportRow {
    fn from(tx: ParsedTransaction) -> ImportRow {
        ImportRow {
            date: Some(tx.date),
            description: Some(tx.description),
            amount: Some(tx.amount),
            category: Some(tx.category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_trims_and_caps() {
        assert_eq!(Category::new("  Food & Dining  "), "Food & Dining");
        let long = "x".repeat(200);
        assert_eq!(Category::new(long.as_str()).as_str().len(), 100);
    }

    #[test]
    fn test_category_unknown_placeholder() {
        assert!(Category::new("").is_unknown());
        assert!(Category::new("   ").is_unknown());
        assert!(Category::new("Unknown").is_unknown());
        assert!(Category::new("UNKNOWN").is_unknown());
        assert!(!Category::new("Shopping").is_unknown());
    }

    #[test]
    fn test_import_row_defaults_missing_fields() {
        let row: ImportRow = serde_json::from_str(r#"{"date":"2024-01-05"}"#).unwrap();
        assert_eq!(row.date.as_deref(), Some("2024-01-05"));
        assert!(row.description.is_none());
        assert!(row.amount.is_none());
        assert!(row.category.is_none());
    }
}
