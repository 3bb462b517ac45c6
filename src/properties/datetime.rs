use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::errors::{ConfigurationError, Result};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y:%m:%d %H:%M:%S",
    "%Y%m%dT%H%M%S",
];

/// Parse a date or date-time, naive values are taken as UTC.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    let date = match trimmed.len() {
        4 => NaiveDate::parse_from_str(&format!("{trimmed}-01-01"), "%Y-%m-%d"),
        7 => NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"),
        _ => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"),
    };
    date.ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ConfigurationError::InvalidDatetime {
                input: input.to_string(),
            }
            .into()
        })
}

/// RFC 3339 with a `Z` suffix, fractional seconds only when present.
pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Temporal extent of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Instant(DateTime<Utc>),
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Temporal {
    /// Parse `instant` or `start/end`.
    pub fn parse(input: &str) -> Result<Self> {
        match input.split_once('/') {
            Some((start, end)) => Ok(Self::Range {
                start: parse_datetime(start)?,
                end: parse_datetime(end)?,
            }),
            None => parse_datetime(input).map(Self::Instant),
        }
    }

    /// Temporal properties, `datetime` or the range pair, never both.
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        match self {
            Self::Instant(datetime) => {
                properties.insert("datetime".into(), format_datetime(datetime).into());
            }
            Self::Range { start, end } => {
                properties.insert("start_datetime".into(), format_datetime(start).into());
                properties.insert("end_datetime".into(), format_datetime(end).into());
            }
        }
        properties
    }
}
