use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(st|nd|rd|th)\b").expect("valid ordinal regex"));

/// Date formats accepted on the command line, tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// Inclusive range of calendar days, interpreted in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Build a range from user input; a missing end date means today
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self, ValidationError> {
        let start = parse_date(start)?;
        let end = match end {
            Some(end) => parse_date(end)?,
            None => Utc::now().date_naive(),
        };
        Ok(Self { start, end })
    }

    /// True when start falls after end; such a range matches no commits
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// First second of the start day (Unix epoch seconds)
    pub fn since_timestamp(&self) -> i64 {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN))
            .timestamp()
    }

    /// Last second of the end day (Unix epoch seconds)
    pub fn until_timestamp(&self) -> i64 {
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Utc.from_utc_datetime(&self.end.and_time(last_second))
            .timestamp()
    }

    /// Whether a commit time falls within the range, bounds included
    pub fn contains(&self, timestamp: i64) -> bool {
        !self.is_empty()
            && timestamp >= self.since_timestamp()
            && timestamp <= self.until_timestamp()
    }
}

/// Parse a user-supplied date into a calendar day.
///
/// Accepts ISO dates (padded or not), slash dates, compact `YYYYMMDD`, month names
/// with optional ordinal suffixes, RFC 3339 timestamps and Unix timestamps in
/// seconds or milliseconds.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidDate(input.to_string()));
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        if trimmed.len() == 8
            && let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        {
            return Ok(date);
        }
        return parse_unix_timestamp(trimmed).ok_or_else(|| ValidationError::InvalidDate(input.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }

    let cleaned = ORDINAL_SUFFIX.replace_all(trimmed, "$1");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
        .ok_or_else(|| ValidationError::InvalidDate(input.to_string()))
}

fn parse_unix_timestamp(digits: &str) -> Option<NaiveDate> {
    let mut value: i64 = digits.parse().ok()?;
    // Values this large are milliseconds
    if value > 10_000_000_000 {
        value /= 1000;
    }
    DateTime::from_timestamp(value, 0).map(|dt| dt.date_naive())
}
