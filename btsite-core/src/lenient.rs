//! Best-effort decoding of loosely typed values extracted from site pages.
//!
//! Extraction templates yield text for most fields, and API sites are not
//! consistent about quoting numbers. Unparseable input degrades to zero or an
//! empty value instead of failing the whole record.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses an integer, accepting surrounding whitespace and a fractional part.
///
/// Returns 0 when the text is not numeric.
pub fn parse_i64(text: &str) -> i64 {
    let trimmed = text.trim().replace(',', "");
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    trimmed.parse::<f64>().map(|v| v as i64).unwrap_or(0)
}

/// Parses a float, returning 0.0 when the text is not numeric.
pub fn parse_f64(text: &str) -> f64 {
    text.trim().replace(',', "").parse::<f64>().unwrap_or(0.0)
}

/// Converts a feed or page date into a Unix timestamp in seconds.
///
/// Understands RFC 2822 (RSS `pubDate`), RFC 3339 and the common
/// `YYYY-MM-DD HH:MM:SS` form, the latter interpreted as UTC. Returns 0 for
/// anything else.
pub fn parse_timestamp(text: &str) -> i64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return dt.timestamp();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.timestamp();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return dt.and_utc().timestamp();
    }
    if let Some(dt) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return dt.and_utc().timestamp();
    }
    0
}

fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_f64(s),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|v| v as i64))
            .unwrap_or(0),
        Value::String(s) => parse_i64(s),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

pub(crate) fn de_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_i64(&Value::deserialize(deserializer)?))
}

pub(crate) fn de_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = value_to_i64(&Value::deserialize(deserializer)?);
    Ok(u32::try_from(value).unwrap_or(0))
}

pub(crate) fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_f64(&Value::deserialize(deserializer)?))
}

pub(crate) fn de_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

/// Accepts epoch seconds as a number or numeric text, or a formatted date.
pub(crate) fn de_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if s.trim().parse::<i64>().is_err() => parse_timestamp(&s),
        other => value_to_i64(&other),
    })
}

pub(crate) fn de_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

pub(crate) fn de_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}
