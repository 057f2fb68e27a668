use chrono::NaiveDate;

use crate::models::TypeHint;

/// Normalize a statement date into `YYYY-MM-DD`.
///
/// Accepts ISO dates, US month/day/year with slash or dash separators and
/// 2- or 4-digit years, and bare month/day rows (common on PDF statements
/// that only print the year in the header). `fallback_year` fills in the
/// year for those bare rows. Impossible dates like 02/31 return `None`.
pub fn normalize_date(raw: &str, fallback_year: i32) -> Option<String> {
    let s = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    parse_iso(s)
        .or_else(|| parse_mdy(s))
        .or_else(|| parse_month_day(s, fallback_year))
}

fn parse_iso(s: &str) -> Option<String> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 {
        return None;
    }
    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;
    canonical(year, month, day)
}

fn parse_mdy(s: &str) -> Option<String> {
    let sep = separator(s)?;
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 3 {
        return None;
    }
    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    let year_text = parts[2].trim();
    let year: i32 = match year_text.len() {
        4 => year_text.parse().ok()?,
        2 => expand_year(year_text.parse().ok()?),
        _ => return None,
    };
    canonical(year, month, day)
}

fn parse_month_day(s: &str, fallback_year: i32) -> Option<String> {
    let sep = separator(s)?;
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 2 {
        return None;
    }
    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    canonical(fallback_year, month, day)
}

fn separator(s: &str) -> Option<char> {
    if s.contains('/') {
        Some('/')
    } else if s.contains('-') {
        Some('-')
    } else {
        None
    }
}

/// Two-digit years above 50 belong to the 1900s, the rest to the 2000s.
fn expand_year(two_digit: i32) -> i32 {
    if two_digit > 50 {
        1900 + two_digit
    } else {
        2000 + two_digit
    }
}

fn canonical(year: i32, month: u32, day: u32) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Normalize raw amount text into a signed dollar value.
///
/// Strips currency symbols, thousands separators, and surrounding quotes.
/// Accounting parentheses mean negative. A `Debit` hint forces the result
/// negative no matter how the source printed the sign; a `Credit` hint
/// keeps the parsed sign. Unparseable or non-finite input returns `None`.
pub fn normalize_amount(raw: &str, hint: Option<TypeHint>) -> Option<f64> {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .replace([',', '$'], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let value = if let Some(inner) = cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        -inner.trim().parse::<f64>().ok()?
    } else {
        cleaned.parse::<f64>().ok()?
    };
    if !value.is_finite() {
        return None;
    }

    let value = match hint {
        Some(TypeHint::Debit) => -value.abs(),
        _ => value,
    };
    Some(round_cents(value))
}

/// Round to cents, halves away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Collapse runs of whitespace, trim, and cap at 500 characters. Every
/// description that reaches the database goes through this.
pub fn clean_description(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_dates_pass_through() {
        assert_eq!(normalize_date("2024-01-05", 2024).as_deref(), Some("2024-01-05"));
        assert_eq!(normalize_date(" 2024-1-5 ", 2024).as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_us_dates_with_four_digit_year() {
        assert_eq!(normalize_date("01/05/2024", 1999).as_deref(), Some("2024-01-05"));
        assert_eq!(normalize_date("1/5/2024", 1999).as_deref(), Some("2024-01-05"));
        assert_eq!(normalize_date("01-05-2024", 1999).as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_two_digit_year_window() {
        assert_eq!(normalize_date("1/5/24", 2024).as_deref(), Some("2024-01-05"));
        assert_eq!(normalize_date("12/31/99", 2024).as_deref(), Some("1999-12-31"));
        assert_eq!(normalize_date("06/15/51", 2024).as_deref(), Some("1951-06-15"));
        assert_eq!(normalize_date("06/15/50", 2024).as_deref(), Some("2050-06-15"));
    }

    #[test]
    fn test_month_day_uses_fallback_year() {
        assert_eq!(normalize_date("04/22", 2023).as_deref(), Some("2023-04-22"));
        assert_eq!(normalize_date("4/2", 2023).as_deref(), Some("2023-04-02"));
    }

    #[test]
    fn test_impossible_dates_rejected() {
        assert!(normalize_date("02/31/2024", 2024).is_none());
        assert!(normalize_date("2024-02-31", 2024).is_none());
        assert!(normalize_date("13/01/2024", 2024).is_none());
        assert!(normalize_date("00/10/2024", 2024).is_none());
    }

    #[test]
    fn test_garbage_dates_rejected() {
        assert!(normalize_date("", 2024).is_none());
        assert!(normalize_date("not a date", 2024).is_none());
        assert!(normalize_date("2024/01", 2024).is_none());
        assert!(normalize_date("1/2/3/4", 2024).is_none());
    }

    #[test]
    fn test_quoted_dates_accepted() {
        assert_eq!(normalize_date("\"01/05/2024\"", 2024).as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_amount_strips_symbols_and_separators() {
        assert_eq!(normalize_amount("$1,234.56", None), Some(1234.56));
        assert_eq!(normalize_amount("\"1,234.56\"", None), Some(1234.56));
        assert_eq!(normalize_amount(" 45.00 ", None), Some(45.0));
    }

    #[test]
    fn test_amount_parentheses_mean_negative() {
        assert_eq!(normalize_amount("(45.00)", None), Some(-45.0));
        assert_eq!(normalize_amount("($1,045.20)", None), Some(-1045.2));
    }

    #[test]
    fn test_amount_explicit_signs_kept() {
        assert_eq!(normalize_amount("-45.00", None), Some(-45.0));
        assert_eq!(normalize_amount("+45.00", None), Some(45.0));
    }

    #[test]
    fn test_debit_hint_forces_negative() {
        assert_eq!(normalize_amount("45.00", Some(TypeHint::Debit)), Some(-45.0));
        // already negative stays negative, the hint is idempotent
        assert_eq!(normalize_amount("-45.00", Some(TypeHint::Debit)), Some(-45.0));
    }

    #[test]
    fn test_credit_hint_keeps_parsed_sign() {
        assert_eq!(normalize_amount("45.00", Some(TypeHint::Credit)), Some(45.0));
        assert_eq!(normalize_amount("-45.00", Some(TypeHint::Credit)), Some(-45.0));
    }

    #[test]
    fn test_unparseable_amounts_rejected() {
        assert!(normalize_amount("abc", None).is_none());
        assert!(normalize_amount("", None).is_none());
        assert!(normalize_amount("$", None).is_none());
        assert!(normalize_amount("nan", None).is_none());
        assert!(normalize_amount("inf", None).is_none());
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(1.239), 1.24);
        assert_eq!(round_cents(-1.239), -1.24);
        assert_eq!(round_cents(10.0), 10.0);
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("  POS   DEBIT\tACME  "), "POS DEBIT ACME");
        let long = "a ".repeat(400);
        assert_eq!(clean_description(&long).chars().count(), 500);
    }
}
