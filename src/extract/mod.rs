pub mod csv;
pub mod pdf;

use std::path::Path;

use chrono::{Datelike, Local};
use rusqlite::Connection;

use crate::categorizer::CategoryEngine;
use crate::error::{FlorinError, Result};
use crate::models::{FileType, NormalizedRow, ParsedStatement, ParsedTransaction, RawTransaction};
use crate::normalize::{clean_description, normalize_amount, normalize_date};

const HEADER_WORDS: &[&str] = &[
    "date",
    "description",
    "amount",
    "transaction",
    "balance",
    "total",
];

/// Header echoes inside statement bodies masquerade as transactions; a
/// description under 3 chars or opening with a column word is not one.
pub(crate) fn acceptable_description(description: &str) -> bool {
    if description.chars().count() < 3 {
        return false;
    }
    let lower = description.to_lowercase();
    !HEADER_WORDS.iter().any(|word| lower.starts_with(word))
}

fn resolve_file_type(filename: &str, declared_mime: &str) -> Option<FileType> {
    let mime = declared_mime.to_lowercase();
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    if mime.contains("pdf") || ext.as_deref() == Some("pdf") {
        Some(FileType::Pdf)
    } else if mime.contains("csv") || ext.as_deref() == Some("csv") {
        Some(FileType::Csv)
    } else {
        None
    }
}

#[cfg(feature = "pdf")]
fn pdf_text(data: &[u8], file_name: &str) -> Result<String> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| FlorinError::ParseFailure {
        file_name: file_name.to_string(),
        file_type: FileType::Pdf.as_str().to_string(),
        message: e.to_string(),
    })
}

#[cfg(not(feature = "pdf"))]
fn pdf_text(_data: &[u8], file_name: &str) -> Result<String> {
    Err(FlorinError::UnsupportedFormat(format!(
        "{file_name} (this build has no PDF support)"
    )))
}

/// Normalize raw field text into dated, signed rows. Lines that fail date
/// or amount parsing are dropped, as are near-zero noise amounts (balance
/// echoes, $0.00 lines).
fn normalize_rows(raw: &[RawTransaction], fallback_year: i32) -> Vec<NormalizedRow> {
    let mut rows = Vec::new();
    for candidate in raw {
        let Some(date) = normalize_date(&candidate.date_text, fallback_year) else {
            log::debug!("dropping row with unparseable date {:?}", candidate.date_text);
            continue;
        };
        let Some(amount) = normalize_amount(&candidate.amount_text, candidate.type_hint) else {
            log::debug!("dropping row with unparseable amount {:?}", candidate.amount_text);
            continue;
        };
        if amount.abs() <= 0.01 {
            continue;
        }
        let description = clean_description(&candidate.description_text);
        rows.push(NormalizedRow {
            date,
            description,
            amount,
        });
    }
    rows
}

/// Dialect-sniffed extraction over already-extracted PDF text. When a
/// bank dialect's patterns claim no usable rows, the text is re-run
/// through the generic patterns.
fn pdf_rows(text: &str, file_name: &str, fallback_year: i32) -> Result<Vec<NormalizedRow>> {
    let dialect = pdf::detect(text);
    log::info!("{file_name}: pdf dialect {}", dialect.key());
    let mut rows = normalize_rows(&pdf::extract(dialect, text)?, fallback_year);
    if rows.is_empty() && dialect != pdf::PdfDialect::Generic {
        log::warn!(
            "{file_name}: {} patterns matched nothing, falling back to generic",
            dialect.key()
        );
        rows = normalize_rows(&pdf::extract(pdf::PdfDialect::Generic, text)?, fallback_year);
    }
    Ok(rows)
}

/// Full extraction pipeline for one uploaded statement: resolve the file
/// type, sniff the bank dialect, extract and normalize rows (falling back
/// to the generic extractor when a bank-specific one finds nothing), then
/// categorize each row for preview.
pub fn process_statement(
    conn: &Connection,
    engine: &CategoryEngine,
    data: &[u8],
    original_filename: &str,
    declared_mime: &str,
) -> Result<ParsedStatement> {
    let file_type = resolve_file_type(original_filename, declared_mime).ok_or_else(|| {
        FlorinError::UnsupportedFormat(format!("{original_filename} ({declared_mime})"))
    })?;
    let fallback_year = Local::now().year();

    let normalized = match file_type {
        FileType::Pdf => {
            let text = pdf_text(data, original_filename)?;
            pdf_rows(&text, original_filename, fallback_year)?
        }
        FileType::Csv => {
            let text = String::from_utf8_lossy(data);
            let dialect = csv::detect(&text);
            log::info!("{original_filename}: csv dialect {}", dialect.key());
            let extracted = csv::extract(dialect, &text)
                .map_err(|e| parse_failure(original_filename, file_type, e))?;
            let mut rows = normalize_rows(&extracted, fallback_year);
            if rows.is_empty() && dialect != csv::CsvDialect::Generic {
                log::warn!(
                    "{original_filename}: {} columns matched nothing, falling back to generic",
                    dialect.key()
                );
                let extracted = csv::extract(csv::CsvDialect::Generic, &text)
                    .map_err(|e| parse_failure(original_filename, file_type, e))?;
                rows = normalize_rows(&extracted, fallback_year);
            }
            rows
        }
    };

    if normalized.is_empty() {
        return Err(FlorinError::NoTransactionsFound {
            file_name: original_filename.to_string(),
            file_type: file_type.as_str().to_string(),
            file_size: data.len(),
        });
    }

    let transactions: Vec<ParsedTransaction> = normalized
        .into_iter()
        .map(|row| {
            let category = engine.categorize(conn, &row.description, Some(row.amount));
            ParsedTransaction {
                date: row.date,
                description: row.description,
                amount: row.amount,
                category,
            }
        })
        .collect();

    Ok(ParsedStatement {
        file_name: original_filename.to_string(),
        file_type,
        total_count: transactions.len(),
        transactions,
    })
}

fn parse_failure(file_name: &str, file_type: FileType, source: FlorinError) -> FlorinError {
    FlorinError::ParseFailure {
        file_name: file_name.to_string(),
        file_type: file_type.as_str().to_string(),
        message: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::models::TypeHint;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_resolve_file_type() {
        assert_eq!(resolve_file_type("x.pdf", ""), Some(FileType::Pdf));
        assert_eq!(resolve_file_type("x.CSV", ""), Some(FileType::Csv));
        assert_eq!(resolve_file_type("export", "text/csv"), Some(FileType::Csv));
        assert_eq!(
            resolve_file_type("statement", "application/pdf"),
            Some(FileType::Pdf)
        );
        // extension wins even when the declared type is vague
        assert_eq!(resolve_file_type("x.csv", "text/plain"), Some(FileType::Csv));
        assert_eq!(resolve_file_type("x.xlsx", "application/zip"), None);
    }

    #[test]
    fn test_acceptable_description() {
        assert!(acceptable_description("WHOLE FOODS"));
        assert!(!acceptable_description("AB"));
        assert!(!acceptable_description("Date Posted"));
        assert!(!acceptable_description("TOTAL FEES"));
        assert!(!acceptable_description("Balance Forward"));
    }

    #[test]
    fn test_normalize_rows_drops_noise_and_bad_fields() {
        let raw = vec![
            RawTransaction {
                date_text: "04/15/2024".into(),
                description_text: "GOOD ROW".into(),
                amount_text: "-20.00".into(),
                type_hint: None,
            },
            RawTransaction {
                date_text: "02/31/2024".into(),
                description_text: "BAD DATE".into(),
                amount_text: "-20.00".into(),
                type_hint: None,
            },
            RawTransaction {
                date_text: "04/15/2024".into(),
                description_text: "BAD AMOUNT".into(),
                amount_text: "n/a".into(),
                type_hint: None,
            },
            RawTransaction {
                date_text: "04/15/2024".into(),
                description_text: "ZERO NOISE".into(),
                amount_text: "0.00".into(),
                type_hint: None,
            },
        ];
        let rows = normalize_rows(&raw, 2024);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "GOOD ROW");
        assert_eq!(rows[0].amount, -20.0);
    }

    #[test]
    fn test_normalize_rows_applies_debit_hint() {
        let raw = vec![RawTransaction {
            date_text: "04/15".into(),
            description_text: "CARD PURCHASE".into(),
            amount_text: "45.00".into(),
            type_hint: Some(TypeHint::Debit),
        }];
        let rows = normalize_rows(&raw, 2023);
        assert_eq!(rows[0].date, "2023-04-15");
        assert_eq!(rows[0].amount, -45.0);
    }

    #[test]
    fn test_process_statement_csv_end_to_end() {
        let (_dir, conn) = test_db();
        let engine = CategoryEngine::new(None, None);
        let data = "Date,Description,Amount\n\
                    2024-04-01,NETFLIX.COM,-15.49\n\
                    2024-04-02,PAYROLL DEPOSIT,2100.00\n";
        let parsed =
            process_statement(&conn, &engine, data.as_bytes(), "export.csv", "text/csv").unwrap();
        assert_eq!(parsed.file_type, FileType::Csv);
        assert_eq!(parsed.total_count, 2);
        assert_eq!(parsed.transactions[0].category, "Entertainment");
        assert_eq!(parsed.transactions[1].category, "Income");
    }

    #[test]
    fn test_process_statement_unsupported_format() {
        let (_dir, conn) = test_db();
        let engine = CategoryEngine::new(None, None);
        let err =
            process_statement(&conn, &engine, b"whatever", "notes.txt", "text/plain").unwrap_err();
        assert!(matches!(err, FlorinError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_process_statement_no_transactions() {
        let (_dir, conn) = test_db();
        let engine = CategoryEngine::new(None, None);
        let data = "Date,Description,Amount\n";
        let err = process_statement(&conn, &engine, data.as_bytes(), "empty.csv", "text/csv")
            .unwrap_err();
        match err {
            FlorinError::NoTransactionsFound {
                file_name,
                file_type,
                file_size,
            } => {
                assert_eq!(file_name, "empty.csv");
                assert_eq!(file_type, "csv");
                assert_eq!(file_size, data.len());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_csv_fallback_to_generic() {
        let (_dir, conn) = test_db();
        let engine = CategoryEngine::new(None, None);
        // Sniffs as BofA checking but carries none of its rows; the bare
        // date,description,amount body must still come through generic.
        let data = "running bal. report\n\
                    date,description,amount\n\
                    04/01/2024,CORNER STORE,-10.00\n";
        let parsed =
            process_statement(&conn, &engine, data.as_bytes(), "weird.csv", "text/csv").unwrap();
        assert_eq!(parsed.total_count, 1);
        assert_eq!(parsed.transactions[0].description, "CORNER STORE");
    }

    #[test]
    fn test_pdf_fallback_to_generic() {
        // The letterhead sniffs as BofA, but the body prints month/day
        // dates its MM/DD/YY patterns reject; generic must pick them up.
        let text = "Bank of America preferred rewards\n\
                    04/12 GROCERY OUTLET OAKLAND -45.90\n\
                    04/13 PAYROLL ACME LLC 1,250.00\n";
        assert_eq!(pdf::detect(text), pdf::PdfDialect::Bofa);
        let rows = pdf_rows(text, "statement.pdf", 2024).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2024-04-12");
        assert_eq!(rows[0].description, "GROCERY OUTLET OAKLAND");
        assert_eq!(rows[0].amount, -45.90);
        assert_eq!(rows[1].amount, 1250.00);
    }
}
