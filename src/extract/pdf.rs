use regex::{Captures, Regex};

use crate::error::Result;
use crate::models::{RawTransaction, TypeHint};
use crate::normalize::clean_description;

use super::acceptable_description;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfDialect {
    AppleCard,
    Bofa,
    ChaseChecking,
    ChaseCreditCard,
    Generic,
}

impl PdfDialect {
    pub fn key(&self) -> &'static str {
        match self {
            Self::AppleCard => "apple_card",
            Self::Bofa => "bofa",
            Self::ChaseChecking => "chase_checking",
            Self::ChaseCreditCard => "chase_credit_card",
            Self::Generic => "generic",
        }
    }
}

/// Sniff the extracted text for issuer-specific phrases. Priority order
/// matters: "chase" + "checking summary" must win over the bare "chase"
/// credit-card test.
pub fn detect(text: &str) -> PdfDialect {
    let haystack = text.to_lowercase();
    if haystack.contains("apple card") && haystack.contains("goldman sachs") {
        PdfDialect::AppleCard
    } else if haystack.contains("bank of america") {
        PdfDialect::Bofa
    } else if haystack.contains("chase") && haystack.contains("checking summary") {
        PdfDialect::ChaseChecking
    } else if haystack.contains("chase") {
        PdfDialect::ChaseCreditCard
    } else {
        PdfDialect::Generic
    }
}

// ---------------------------------------------------------------------------
// Line patterns
// ---------------------------------------------------------------------------

/// How a matched line's amount sign is resolved.
#[derive(Debug, Clone, Copy)]
enum Sign {
    /// Keep whatever sign the amount text carries.
    Keep,
    /// Force the amount negative; used for card purchase rows printed
    /// unsigned.
    ForceDebit,
    /// Read the captured `type` token: DEBIT forces negative, anything
    /// else keeps the parsed sign.
    FromToken,
}

struct LinePattern {
    name: &'static str,
    re: Regex,
    sign: Sign,
}

// Apple Card statements print purchases as
//   MM/DD/YYYY  DESC  2%  $0.09  $4.50
// and payments with an explicit leading minus. The minus is excluded from
// the payment capture so payments come out positive (money into the card).
const APPLE_CARD_PATTERNS: &[(&str, &str, Sign)] = &[
    (
        "payment",
        r"^(?P<date>\d{2}/\d{2}/\d{4})\s+(?P<desc>.+?)\s+-\$(?P<amount>[\d,]+\.\d{2})\s*$",
        Sign::Keep,
    ),
    (
        "purchase_daily_cash",
        r"^(?P<date>\d{2}/\d{2}/\d{4})\s+(?P<desc>.+?)\s+\d{1,2}%\s+\$[\d,]+\.\d{2}\s+\$(?P<amount>[\d,]+\.\d{2})\s*$",
        Sign::ForceDebit,
    ),
    (
        "charge",
        r"^(?P<date>\d{2}/\d{2}/\d{4})\s+(?P<desc>.+?)\s+\$(?P<amount>[\d,]+\.\d{2})\s*$",
        Sign::ForceDebit,
    ),
];

// Deposit-account statements carry signed amounts and MM/DD/YY dates,
// sometimes with a trailing running balance column.
const BOFA_PATTERNS: &[(&str, &str, Sign)] = &[
    (
        "dated_with_balance",
        r"^(?P<date>\d{2}/\d{2}/\d{2})\s+(?P<desc>.+?)\s+(?P<amount>-?[\d,]+\.\d{2})\s+-?[\d,]+\.\d{2}\s*$",
        Sign::Keep,
    ),
    (
        "dated",
        r"^(?P<date>\d{2}/\d{2}/\d{2})\s+(?P<desc>.+?)\s+(?P<amount>-?[\d,]+\.\d{2})\s*$",
        Sign::Keep,
    ),
];

// Chase checking detail rows: MM/DD date, description, signed amount,
// optional running balance.
const CHASE_CHECKING_PATTERNS: &[(&str, &str, Sign)] = &[
    (
        "detail_with_balance",
        r"^\s*(?P<date>\d{2}/\d{2})\s+(?P<desc>.+?)\s+(?P<amount>-?[\d,]+\.\d{2})\s+-?[\d,]+\.\d{2}\s*$",
        Sign::Keep,
    ),
    (
        "detail",
        r"^\s*(?P<date>\d{2}/\d{2})\s+(?P<desc>.+?)\s+(?P<amount>-?[\d,]+\.\d{2})\s*$",
        Sign::Keep,
    ),
];

// Chase card statements print payments/credits with an explicit minus and
// purchases unsigned. The credit pattern must run first so the charge
// pattern never swallows a minus into the description.
const CHASE_CREDIT_CARD_PATTERNS: &[(&str, &str, Sign)] = &[
    (
        "payment_or_credit",
        r"^\s*(?P<date>\d{2}/\d{2})\s+(?P<desc>.+?)\s+-\$?(?P<amount>[\d,]+\.\d{2})\s*$",
        Sign::Keep,
    ),
    (
        "charge",
        r"^\s*(?P<date>\d{2}/\d{2})\s+(?P<desc>.+?)\s+\$?(?P<amount>[\d,]+\.\d{2})\s*$",
        Sign::ForceDebit,
    ),
];

// Broad patterns for statements that sniffed as no known issuer, or as a
// fallback when an issuer's strict patterns matched nothing.
const GENERIC_PATTERNS: &[(&str, &str, Sign)] = &[
    (
        "typed",
        r"(?i)^\s*(?P<date>\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?)\s+(?P<desc>.+?)\s+(?P<type>debit|credit|payment|deposit)\s+(?P<amount>\(?-?\$?[\d,]+\.\d{2}\)?)\s*$",
        Sign::FromToken,
    ),
    (
        "tabbed",
        r"^(?P<date>[\d/-]{4,10})\t+(?P<desc>[^\t]+?)\t+(?P<amount>\(?-?\$?[\d,]+(?:\.\d{1,2})?\)?)\s*$",
        Sign::Keep,
    ),
    (
        "iso",
        r"^\s*(?P<date>\d{4}-\d{2}-\d{2})\s+(?P<desc>.+?)\s+(?P<amount>\(?-?\$?[\d,]+\.\d{2}\)?)\s*$",
        Sign::Keep,
    ),
    (
        "us_with_balance",
        r"^\s*(?P<date>\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\s+(?P<desc>.+?)\s+(?P<amount>\(?-?\$?[\d,]+\.\d{2}\)?)\s+-?\$?[\d,]+\.\d{2}\s*$",
        Sign::Keep,
    ),
    (
        "us",
        r"^\s*(?P<date>\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\s+(?P<desc>.+?)\s+(?P<amount>\(?-?\$?[\d,]+\.\d{2}\)?)\s*$",
        Sign::Keep,
    ),
    (
        "month_day",
        r"^\s*(?P<date>\d{1,2}/\d{1,2})\s+(?P<desc>.+?)\s+(?P<amount>\(?-?\$?[\d,]+\.\d{2}\)?)(?:\s+-?\$?[\d,]+\.\d{2})?\s*$",
        Sign::Keep,
    ),
];

fn patterns(dialect: PdfDialect) -> Result<Vec<LinePattern>> {
    let specs = match dialect {
        PdfDialect::AppleCard => APPLE_CARD_PATTERNS,
        PdfDialect::Bofa => BOFA_PATTERNS,
        PdfDialect::ChaseChecking => CHASE_CHECKING_PATTERNS,
        PdfDialect::ChaseCreditCard => CHASE_CREDIT_CARD_PATTERNS,
        PdfDialect::Generic => GENERIC_PATTERNS,
    };
    specs
        .iter()
        .map(|(name, pattern, sign)| {
            Ok(LinePattern {
                name,
                re: Regex::new(pattern)?,
                sign: *sign,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Run the dialect's pattern list over every line of extracted PDF text.
/// The first pattern that matches claims the line, even when the match is
/// then thrown out as a header echo.
pub fn extract(dialect: PdfDialect, text: &str) -> Result<Vec<RawTransaction>> {
    let patterns = patterns(dialect)?;
    let mut rows = Vec::new();
    for line in text.lines() {
        if line.trim().len() < 10 {
            continue;
        }
        for pattern in &patterns {
            let Some(caps) = pattern.re.captures(line) else {
                continue;
            };
            log::trace!("{} pattern {:?} claimed line", dialect.key(), pattern.name);
            if let Some(row) = build_row(pattern, &caps) {
                rows.push(row);
            }
            break;
        }
    }
    log::debug!("pdf dialect {}: {} candidate rows", dialect.key(), rows.len());
    Ok(rows)
}

fn build_row(pattern: &LinePattern, caps: &Captures) -> Option<RawTransaction> {
    let description = clean_description(caps.name("desc")?.as_str());
    if !acceptable_description(&description) {
        return None;
    }
    let type_hint = match pattern.sign {
        Sign::Keep => None,
        Sign::ForceDebit => Some(TypeHint::Debit),
        Sign::FromToken => caps.name("type").map(|token| {
            if token.as_str().eq_ignore_ascii_case("debit") {
                TypeHint::Debit
            } else {
                TypeHint::Credit
            }
        }),
    };
    Some(RawTransaction {
        date_text: caps.name("date")?.as_str().to_string(),
        description_text: description,
        amount_text: caps.name("amount")?.as_str().to_string(),
        type_hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_priority() {
        assert_eq!(
            detect("Apple Card statement issued by Goldman Sachs Bank"),
            PdfDialect::AppleCard
        );
        assert_eq!(detect("Bank of America account summary"), PdfDialect::Bofa);
        assert_eq!(
            detect("CHASE Total Checking\nCHECKING SUMMARY\n"),
            PdfDialect::ChaseChecking
        );
        assert_eq!(detect("Chase Freedom statement"), PdfDialect::ChaseCreditCard);
        assert_eq!(detect("Some Credit Union"), PdfDialect::Generic);
    }

    #[test]
    fn test_apple_card_purchases_forced_negative() {
        let text = "Apple Card statement\n\
                    06/01/2024    BLUE BOTTLE COFFEE OAKLAND CA    2%    $0.09    $4.50\n\
                    06/03/2024    WHOLE FOODS MARKET BERKELEY CA    3%    $2.58    $86.12\n";
        let rows = extract(PdfDialect::AppleCard, text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date_text, "06/01/2024");
        assert_eq!(rows[0].description_text, "BLUE BOTTLE COFFEE OAKLAND CA");
        assert_eq!(rows[0].amount_text, "4.50");
        assert_eq!(rows[0].type_hint, Some(TypeHint::Debit));
    }

    #[test]
    fn test_apple_card_payment_kept_positive() {
        let text = "06/10/2024    ACH Deposit Internet Transfer    -$500.00\n";
        let rows = extract(PdfDialect::AppleCard, text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_text, "500.00");
        assert_eq!(rows[0].type_hint, None);
    }

    #[test]
    fn test_chase_checking_detail_rows() {
        let text = "04/15  ATM WITHDRAWAL 042 BROADWAY  -200.00  1,543.22\n\
                    04/16  ONLINE DEPOSIT  350.00\n";
        let rows = extract(PdfDialect::ChaseChecking, text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description_text, "ATM WITHDRAWAL 042 BROADWAY");
        assert_eq!(rows[0].amount_text, "-200.00");
        assert_eq!(rows[1].amount_text, "350.00");
    }

    #[test]
    fn test_chase_card_sign_resolution() {
        let text = "05/02  AUTOMATIC PAYMENT - THANK YOU  -4,270.00\n\
                    05/04  NETFLIX.COM  15.49\n";
        let rows = extract(PdfDialect::ChaseCreditCard, text).unwrap();
        assert_eq!(rows.len(), 2);
        // payment minus is excluded from the capture
        assert_eq!(rows[0].amount_text, "4,270.00");
        assert_eq!(rows[0].type_hint, None);
        // purchases are unsigned on the statement and forced negative
        assert_eq!(rows[1].amount_text, "15.49");
        assert_eq!(rows[1].type_hint, Some(TypeHint::Debit));
    }

    #[test]
    fn test_bofa_rows_with_running_balance() {
        let text = "04/15/24  BKOFAMERICA MOBILE 04/15 DEPOSIT  500.00  2,100.00\n\
                    04/18/24  CHECKCARD 0417 CITY MARKET  -42.17\n";
        let rows = extract(PdfDialect::Bofa, text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount_text, "500.00");
        assert_eq!(rows[1].amount_text, "-42.17");
    }

    #[test]
    fn test_generic_typed_token() {
        let text = "04/18/2024  ONLINE PAYMENT TO CITY WATER  DEBIT  $85.00\n\
                    04/19/2024  MOBILE CHECK DEPOSIT  DEPOSIT  $250.00\n";
        let rows = extract(PdfDialect::Generic, text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].type_hint, Some(TypeHint::Debit));
        assert_eq!(rows[1].type_hint, Some(TypeHint::Credit));
    }

    #[test]
    fn test_generic_tab_separated() {
        let text = "04/19/2024\tPAYROLL ACME LLC\t2,500.00\n";
        let rows = extract(PdfDialect::Generic, text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description_text, "PAYROLL ACME LLC");
        assert_eq!(rows[0].amount_text, "2,500.00");
    }

    #[test]
    fn test_generic_iso_and_parenthesized() {
        let text = "2024-04-20  SERVICE FEE  (12.00)\n";
        let rows = extract(PdfDialect::Generic, text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_text, "(12.00)");
    }

    #[test]
    fn test_header_echo_lines_discarded() {
        let text = "01/02/2024  Balance Forward  1,234.56\n\
                    01/02/2024  Total fees for this period  45.00\n\
                    01/03/2024  CORNER BAKERY  12.00\n";
        let rows = extract(PdfDialect::Generic, text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description_text, "CORNER BAKERY");
    }

    #[test]
    fn test_short_lines_and_short_descriptions_skipped() {
        let text = "04/15 2.0\n\
                    01/03/2024  AB  12.00\n\
                    01/03/2024  ABC  12.00\n";
        let rows = extract(PdfDialect::Generic, text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description_text, "ABC");
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        // could match both with_balance and plain detail, must take the first
        let text = "04/15  COFFEE CART  -4.50  1,000.00\n";
        let rows = extract(PdfDialect::ChaseChecking, text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_text, "-4.50");
    }
}
