//! Per-field canonicalization of raw cell text.
//!
//! Nothing here fails: unparseable input degrades to [`Coerced::Missing`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::Coerced;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%d %b %Y", "%b %d, %Y"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Trim, collapse internal whitespace runs to a single space, optionally title-case.
pub fn normalize_text(raw: &str, title: bool) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if title {
        title_case(&collapsed)
    } else {
        collapsed
    }
}

/// Word-initial capitalization: a letter that follows a non-letter is upper-cased,
/// every other letter is lower-cased (`non-vegetarian` → `Non-Vegetarian`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}

/// Coerce to an integer. Integral decimals (`7.0`, `1e3`) are accepted;
/// fractional, non-finite and out-of-range values are `Missing`.
pub fn coerce_integer(raw: &str) -> Coerced<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return Coerced::Missing;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Coerced::Present(n);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Coerced::Present(f as i64)
        }
        _ => Coerced::Missing,
    }
}

/// Coerce to a calendar date. Date-time input keeps only its date part.
pub fn coerce_date(raw: &str) -> Coerced<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return Coerced::Missing;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
        .into()
}

/// Coerce to a date-time. Date-only input is taken as midnight.
pub fn coerce_timestamp(raw: &str) -> Coerced<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return Coerced::Missing;
    }
    parse_datetime(s)
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .into()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
}
