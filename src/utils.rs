use chrono::{Datelike, NaiveDate, NaiveDateTime};

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Parses a record date. Accepts `YYYY-MM-DD`, full ISO timestamps and `YYYY-MM`
/// (which resolves to the first of the month).
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d").ok()
}

/// 0-based position of a three-letter month abbreviation ("Jan" = 0).
pub fn month_index(abbrev: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbrev))
        .map(|i| i as u32)
}

/// Formats a date as a quarterly label, e.g. 2023-03-31 -> "Mar 23".
pub fn quarter_label(date: NaiveDate) -> String {
    format!(
        "{} {:02}",
        MONTH_ABBREVIATIONS[date.month0() as usize],
        date.year().rem_euclid(100)
    )
}

/// Parses a label that is a plain integer, e.g. "2023".
pub fn parse_year_label(label: &str) -> Option<i64> {
    label.trim().parse::<i64>().ok()
}

/// Parses a `"{Mon} {YY}"` label into (two-digit year, 0-based month).
pub fn parse_quarter_label(label: &str) -> Option<(u32, u32)> {
    let (month, year) = label.trim().split_once(' ')?;
    if year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let month = month_index(month)?;
    let year = year.parse::<u32>().ok()?;
    Some((year, month))
}

/// Extracts a four-digit year from a numeric or textual year field.
pub fn parse_four_digit_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Coerces a provider string into a number, stripping currency symbols,
/// thousands separators and a trailing percent sign. `(1,234)` reads as -1234.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let mut text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let negative = text.starts_with('(') && text.ends_with(')');
    if negative {
        text = &text[1..text.len() - 1];
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && !matches!(c, ',' | '_' | ' ' | '%'))
        .collect();

    let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -value } else { value })
}
