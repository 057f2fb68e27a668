use csv::{ReaderBuilder, StringRecord};

use crate::error::Result;
use crate::models::{RawTransaction, TypeHint};
use crate::normalize::normalize_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvDialect {
    ChaseChecking,
    ChaseCreditCard,
    BofaCreditCard,
    BofaChecking,
    Generic,
}

impl CsvDialect {
    pub fn key(&self) -> &'static str {
        match self {
            Self::ChaseChecking => "chase_checking_csv",
            Self::ChaseCreditCard => "chase_credit_card_csv",
            Self::BofaCreditCard => "bofa_credit_card_csv",
            Self::BofaChecking => "bofa_checking_csv",
            Self::Generic => "generic_csv",
        }
    }
}

/// Sniff header phrasing, case-insensitive, first match wins.
pub fn detect(text: &str) -> CsvDialect {
    let haystack = text.to_lowercase();
    let has_all = |needles: &[&str]| needles.iter().all(|n| haystack.contains(n));

    if has_all(&["posting date", "type", "check or slip #"]) {
        CsvDialect::ChaseChecking
    } else if has_all(&["transaction date", "category", "post date"]) {
        CsvDialect::ChaseCreditCard
    } else if has_all(&["posted date", "reference number", "payee"]) {
        CsvDialect::BofaCreditCard
    } else if has_all(&["running bal.", "date,description,amount"]) {
        CsvDialect::BofaChecking
    } else {
        CsvDialect::Generic
    }
}

pub fn extract(dialect: CsvDialect, text: &str) -> Result<Vec<RawTransaction>> {
    // Strip a UTF-8 BOM before any parsing; bank exports love them.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rows = match dialect {
        CsvDialect::ChaseChecking => chase_checking(text)?,
        CsvDialect::ChaseCreditCard => chase_credit_card(text)?,
        CsvDialect::BofaCreditCard => bofa_credit_card(text)?,
        CsvDialect::BofaChecking => bofa_checking(text)?,
        CsvDialect::Generic => generic(text)?,
    };
    log::debug!("csv dialect {}: {} candidate rows", dialect.key(), rows.len());
    Ok(rows)
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn find_column(record: &StringRecord, name: &str) -> Option<usize> {
    record
        .iter()
        .position(|field| field.trim().eq_ignore_ascii_case(name))
}

fn push_row(
    rows: &mut Vec<RawTransaction>,
    record: &StringRecord,
    idx_date: usize,
    idx_desc: usize,
    idx_amount: usize,
    type_hint: Option<TypeHint>,
) {
    let date = record.get(idx_date).unwrap_or("").trim();
    let description = record.get(idx_desc).unwrap_or("").trim();
    let amount = record.get(idx_amount).unwrap_or("").trim();
    if date.is_empty() || description.is_empty() || amount.is_empty() {
        return;
    }
    rows.push(RawTransaction {
        date_text: date.to_string(),
        description_text: description.to_string(),
        amount_text: amount.to_string(),
        type_hint,
    });
}

// ---------------------------------------------------------------------------
// Chase checking: Details,Posting Date,Description,Amount,Type,Balance,...
// ---------------------------------------------------------------------------

fn chase_checking(text: &str) -> Result<Vec<RawTransaction>> {
    let mut rows = Vec::new();
    let mut found_header = false;
    let (mut idx_details, mut idx_date, mut idx_desc, mut idx_amount) = (0, 1, 2, 3);

    for result in reader(text).records() {
        let Ok(record) = result else { continue };
        if !found_header {
            if let Some(pos) = find_column(&record, "posting date") {
                idx_date = pos;
                idx_details = find_column(&record, "details").unwrap_or(idx_details);
                idx_desc = find_column(&record, "description").unwrap_or(idx_desc);
                idx_amount = find_column(&record, "amount").unwrap_or(idx_amount);
                found_header = true;
            }
            continue;
        }
        if record.len() < 3 {
            continue;
        }
        let type_hint = match record.get(idx_details).map(str::trim) {
            Some(d) if d.eq_ignore_ascii_case("debit") => Some(TypeHint::Debit),
            Some(d) if d.eq_ignore_ascii_case("credit") => Some(TypeHint::Credit),
            _ => None,
        };
        push_row(&mut rows, &record, idx_date, idx_desc, idx_amount, type_hint);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Chase credit card: Transaction Date,Post Date,Description,Category,Type,Amount
// ---------------------------------------------------------------------------

fn chase_credit_card(text: &str) -> Result<Vec<RawTransaction>> {
    let mut rows = Vec::new();
    let mut found_header = false;
    let (mut idx_date, mut idx_desc, mut idx_amount) = (0, 2, 5);

    for result in reader(text).records() {
        let Ok(record) = result else { continue };
        if !found_header {
            if let Some(pos) = find_column(&record, "transaction date") {
                idx_date = pos;
                idx_desc = find_column(&record, "description").unwrap_or(idx_desc);
                idx_amount = find_column(&record, "amount").unwrap_or(idx_amount);
                found_header = true;
            }
            continue;
        }
        if record.len() < 3 {
            continue;
        }
        // Chase card exports sign amounts already: purchases negative.
        push_row(&mut rows, &record, idx_date, idx_desc, idx_amount, None);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// BofA credit card: Posted Date,Reference Number,Payee,Address,Amount
// ---------------------------------------------------------------------------

fn bofa_credit_card(text: &str) -> Result<Vec<RawTransaction>> {
    let mut rows = Vec::new();
    let mut found_header = false;
    let (mut idx_date, mut idx_desc, mut idx_amount) = (0, 2, 4);

    for result in reader(text).records() {
        let Ok(record) = result else { continue };
        if !found_header {
            if let Some(pos) = find_column(&record, "posted date") {
                idx_date = pos;
                idx_desc = find_column(&record, "payee").unwrap_or(idx_desc);
                idx_amount = find_column(&record, "amount").unwrap_or(idx_amount);
                found_header = true;
            }
            continue;
        }
        if record.len() < 3 {
            continue;
        }
        push_row(&mut rows, &record, idx_date, idx_desc, idx_amount, None);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// BofA checking: summary preamble, then Date,Description,Amount,Running Bal.
// ---------------------------------------------------------------------------

fn bofa_checking(text: &str) -> Result<Vec<RawTransaction>> {
    let mut rows = Vec::new();
    let mut found_header = false;

    for result in reader(text).records() {
        let Ok(record) = result else { continue };
        if !found_header {
            if record
                .get(0)
                .map(|f| f.trim().eq_ignore_ascii_case("date"))
                .unwrap_or(false)
                && find_column(&record, "running bal.").is_some()
            {
                found_header = true;
            }
            continue;
        }
        if record.len() < 3 {
            continue;
        }
        let description = record.get(1).unwrap_or("").trim();
        // The opening balance row has no amount but some exports give it 0.00
        if description.to_lowercase().contains("beginning balance") {
            continue;
        }
        push_row(&mut rows, &record, 0, 1, 2, None);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Generic CSV: discover columns from the header, else assume positional
// date,description,amount. Supports split debit/credit columns.
// ---------------------------------------------------------------------------

struct GenericColumns {
    date: usize,
    description: usize,
    amount: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
}

impl GenericColumns {
    fn from_header(record: &StringRecord) -> Option<GenericColumns> {
        let date = position_matching(
            record,
            &["date", "posting date", "posted date", "transaction date"],
        )?;
        let description = position_matching(
            record,
            &["description", "payee", "merchant", "memo", "narrative"],
        )?;
        let amount = position_matching(record, &["amount"]);
        let debit = position_matching(record, &["debit", "withdrawal", "withdrawals"]);
        let credit = position_matching(record, &["credit", "deposit", "deposits"]);
        if amount.is_none() && debit.is_none() && credit.is_none() {
            return None;
        }
        Some(GenericColumns {
            date,
            description,
            amount,
            debit,
            credit,
        })
    }

    fn positional() -> GenericColumns {
        GenericColumns {
            date: 0,
            description: 1,
            amount: Some(2),
            debit: None,
            credit: None,
        }
    }
}

fn position_matching(record: &StringRecord, names: &[&str]) -> Option<usize> {
    record.iter().position(|field| {
        let field = field.trim().to_lowercase();
        names.iter().any(|n| field == *n || field.starts_with(n))
    })
}

fn generic(text: &str) -> Result<Vec<RawTransaction>> {
    let mut rows = Vec::new();
    let mut columns: Option<GenericColumns> = None;

    for result in reader(text).records() {
        let Ok(record) = result else { continue };
        if record.len() < 3 {
            continue;
        }
        if columns.is_none() {
            if let Some(mapped) = GenericColumns::from_header(&record) {
                columns = Some(mapped);
                continue;
            }
            // Headerless export: treat this record as data in
            // date,description,amount order.
            columns = Some(GenericColumns::positional());
        }
        let Some(cols) = columns.as_ref() else { continue };

        let Some(amount_text) = resolve_amount_text(cols, &record) else {
            continue;
        };
        let date = record.get(cols.date).unwrap_or("").trim();
        let description = record.get(cols.description).unwrap_or("").trim();
        if date.is_empty() || description.is_empty() {
            continue;
        }
        rows.push(RawTransaction {
            date_text: date.to_string(),
            description_text: description.to_string(),
            amount_text,
            type_hint: None,
        });
    }
    Ok(rows)
}

/// Single signed column when present, otherwise combine split columns as
/// credit minus debit.
fn resolve_amount_text(cols: &GenericColumns, record: &StringRecord) -> Option<String> {
    if let Some(idx) = cols.amount {
        let field = record.get(idx).unwrap_or("").trim();
        if !field.is_empty() {
            return Some(field.to_string());
        }
    }
    let debit_field = cols.debit.and_then(|i| record.get(i)).map(str::trim);
    let credit_field = cols.credit.and_then(|i| record.get(i)).map(str::trim);
    let debit = debit_field.filter(|f| !f.is_empty()).and_then(|f| normalize_amount(f, None));
    let credit = credit_field.filter(|f| !f.is_empty()).and_then(|f| normalize_amount(f, None));
    if debit.is_none() && credit.is_none() {
        return None;
    }
    let amount = credit.unwrap_or(0.0) - debit.unwrap_or(0.0).abs();
    Some(format!("{amount:.2}"))
}
