//! Lenient date parsing for request payloads and query strings.
//!
//! Clients send either a full RFC 3339 timestamp or a bare `YYYY-MM-DD`
//! calendar date. A bare date means midnight UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};

pub fn parse_flexible(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(format!(
        "invalid date `{raw}`: expected YYYY-MM-DD or an RFC 3339 timestamp"
    ))
}

pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, String> {
    parse_flexible(raw).map(|dt| dt.date_naive())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_flexible(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Like [`deserialize_opt`], but a present `null` becomes `Some(None)`.
/// Pair with `#[serde(default)]` so a missing key stays `None`.
pub fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_opt(deserializer).map(Some)
}
