//! Scalar value cleanup and timestamp parsing.
//!
//! Spreadsheet exports and form submissions carry the same value in many
//! shapes: padded text, the literal strings `null`/`undefined`, epoch
//! numbers, or dates written with `.`, `/` or `年月日` separators. This
//! module folds them into trimmed text and epoch milliseconds.
//!
//! None of these functions fail. Unparseable timestamps come back as `None`,
//! which callers must read as "unknown", not as zero.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Full-width (ideographic) space used by CJK input methods.
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Placeholder strings that stand in for a missing value.
const MISSING_PLACEHOLDERS: &[&str] = &["null", "undefined"];

/// Date-time layouts tried after separators are normalized to `-`.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A timestamp candidate in any of the shapes intake data uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimestampValue<'a> {
    /// Epoch milliseconds as a number.
    Millis(f64),
    /// An already-parsed instant.
    DateTime(DateTime<Utc>),
    /// Free text: pure digits (epoch millis) or a date-like string.
    Text(&'a str),
}

impl<'a> From<&'a str> for TimestampValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for TimestampValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<f64> for TimestampValue<'_> {
    fn from(value: f64) -> Self {
        Self::Millis(value)
    }
}

/// Trim a value, mapping `null`/`undefined` placeholders to the empty string.
///
/// # Example
/// ```
/// use care_normalize::normalize_value;
///
/// assert_eq!(normalize_value("  张三 "), "张三");
/// assert_eq!(normalize_value("null"), "");
/// ```
pub fn normalize_value(value: &str) -> String {
    let trimmed = value.trim();
    if MISSING_PLACEHOLDERS
        .iter()
        .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
    {
        return String::new();
    }
    trimmed.to_string()
}

/// [`normalize_value`] for an optional value; `None` becomes empty.
pub fn normalize_optional(value: Option<&str>) -> String {
    value.map(normalize_value).unwrap_or_default()
}

/// Normalize a value and collapse internal whitespace runs to one ASCII space.
///
/// Full-width spaces count as whitespace.
pub fn normalize_spacing(value: &str) -> String {
    let normalized = normalize_value(value);
    normalized
        .split(|c: char| c.is_whitespace() || c == IDEOGRAPHIC_SPACE)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve any supported timestamp shape to epoch milliseconds.
pub fn normalize_timestamp(value: TimestampValue<'_>) -> Option<i64> {
    match value {
        TimestampValue::Millis(millis) => millis_from_number(millis),
        TimestampValue::DateTime(instant) => Some(instant.timestamp_millis()),
        TimestampValue::Text(text) => parse_timestamp_text(text),
    }
}

/// Validate a numeric epoch-millisecond value.
pub fn millis_from_number(millis: f64) -> Option<i64> {
    if !millis.is_finite() {
        return None;
    }
    let truncated = millis.trunc();
    if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}

/// Parse timestamp text.
///
/// Pure-digit text is read as epoch milliseconds. Anything else has its
/// `.`, `/` and `年`/`月` separators rewritten to `-` (and `日`/`号`
/// dropped) before being tried as RFC 3339, a date-time, a date, or a
/// year-month. Naive values are read as UTC.
pub fn parse_timestamp_text(text: &str) -> Option<i64> {
    let value = normalize_spacing(text);
    if value.is_empty() {
        return None;
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<i64>().ok();
    }

    let unified = unify_date_separators(&value);
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&unified) {
        return Some(parsed.timestamp_millis());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&unified, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&unified, "%Y-%m-%d") {
        return date_millis(date);
    }
    NaiveDate::parse_from_str(&format!("{unified}-1"), "%Y-%m-%d")
        .ok()
        .and_then(date_millis)
}

fn date_millis(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|datetime| datetime.and_utc().timestamp_millis())
}

/// Rewrite date separators in the date part only; the time part keeps its
/// `.` fraction separator.
fn unify_date_separators(value: &str) -> String {
    let split = value.find([' ', 'T']).unwrap_or(value.len());
    let (date, time) = value.split_at(split);
    let mut unified = String::with_capacity(value.len());
    for c in date.chars() {
        match c {
            '.' | '/' | '年' | '月' => unified.push('-'),
            '日' | '号' => {}
            other => unified.push(other),
        }
    }
    let date = unified.trim_end_matches('-');
    format!("{date}{time}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn test_normalize_value_placeholders() {
        assert_eq!(normalize_value("null"), "");
        assert_eq!(normalize_value(" undefined "), "");
        assert_eq!(normalize_value("NULL"), "");
        assert_eq!(normalize_value("nullable"), "nullable");
        assert_eq!(normalize_optional(None), "");
        assert_eq!(normalize_optional(Some(" x ")), "x");
    }

    #[test]
    fn test_normalize_spacing_collapses_full_width() {
        assert_eq!(normalize_spacing("  张\u{3000}\u{3000}三  "), "张 三");
        assert_eq!(normalize_spacing("a \t\n b"), "a b");
        assert_eq!(normalize_spacing("undefined"), "");
    }

    #[test]
    fn test_timestamp_from_number() {
        assert_eq!(normalize_timestamp(TimestampValue::Millis(1500.9)), Some(1500));
        assert_eq!(normalize_timestamp(TimestampValue::Millis(f64::NAN)), None);
        assert_eq!(normalize_timestamp(TimestampValue::Millis(f64::INFINITY)), None);
    }

    #[test]
    fn test_timestamp_from_datetime() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            normalize_timestamp(instant.into()),
            Some(instant.timestamp_millis())
        );
    }

    #[test]
    fn test_timestamp_digit_text_is_epoch_millis() {
        assert_eq!(parse_timestamp_text("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_timestamp_text(" 0 "), Some(0));
    }

    #[test]
    fn test_timestamp_separator_variants_agree() {
        let expected = Some(19_362 * DAY_MS); // 2023-01-05
        assert_eq!(parse_timestamp_text("2023-01-05"), expected);
        assert_eq!(parse_timestamp_text("2023/01/05"), expected);
        assert_eq!(parse_timestamp_text("2023.1.5"), expected);
        assert_eq!(parse_timestamp_text("2023年1月5日"), expected);
    }

    #[test]
    fn test_timestamp_with_time_component() {
        let base = 19_362 * DAY_MS;
        assert_eq!(
            parse_timestamp_text("2023/01/05 10:30"),
            Some(base + (10 * 60 + 30) * 60_000)
        );
        assert_eq!(
            parse_timestamp_text("2023-01-05T00:00:01.5Z"),
            Some(base + 1_500)
        );
        assert_eq!(parse_timestamp_text("2023-01-05 00:00:01.250"), Some(base + 1_250));
    }

    #[test]
    fn test_timestamp_year_month() {
        assert_eq!(parse_timestamp_text("2023年1月"), Some(19_358 * DAY_MS));
    }

    #[test]
    fn test_timestamp_unparseable_is_none() {
        assert_eq!(parse_timestamp_text(""), None);
        assert_eq!(parse_timestamp_text("null"), None);
        assert_eq!(parse_timestamp_text("不详"), None);
        assert_eq!(parse_timestamp_text("2023-13-45"), None);
        assert_eq!(parse_timestamp_text("99999999999999999999999"), None);
    }
}
