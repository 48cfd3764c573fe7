use chrono::{SecondsFormat, Utc};
use std::fmt;

/// A UTC timestamp as stored in log entries and `DateTime` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(chrono::DateTime<Utc>);

impl DateTime {
    pub const LOG_DATE_FORMAT: &'static str = "%d %b %Y";
    pub const LOG_TIME_FORMAT: &'static str = "%H:%M:%S UTC";

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_utc(&self) -> &chrono::DateTime<Utc> {
        &self.0
    }

    pub fn format_utc(&self, format: &str) -> String {
        self.0.format(format).to_string()
    }

    /// The date field written on serialized log entries, e.g. `17 Oct 2026`.
    pub fn log_date(&self) -> String {
        self.format_utc(Self::LOG_DATE_FORMAT)
    }

    /// The time field written on serialized log entries, e.g. `20:52:00 UTC`.
    pub fn log_time(&self) -> String {
        self.format_utc(Self::LOG_TIME_FORMAT)
    }

    /// RFC 3339 form with a `Z` suffix; sub-second digits only appear when present.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse_rfc3339(text: &str) -> Result<Self, chrono::ParseError> {
        chrono::DateTime::parse_from_rfc3339(text.trim()).map(|dt| Self(dt.with_timezone(&Utc)))
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
