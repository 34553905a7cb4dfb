//! Time spans for timeseries queries, and the [`AnyDateTime`] conversion trait used
//! to build them from dates, datetimes or strings.

use crate::types::error::ConfigError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use std::fmt;

/// Format of one instant in the API's `timespan` query parameter.
const TIMESPAN_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The earliest and latest instant covered by a date-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartEndDateTime {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Anything that can be resolved to a range of UTC instants.
///
/// A single instant resolves to a zero-length range; a calendar date resolves to
/// the whole day. [`TimeSpan::new`] takes the `start` of its first argument and the
/// `end` of its second, so `TimeSpan::new(day, day)` covers that entire day.
pub trait AnyDateTime {
    fn get_datetime_range(self) -> Option<StartEndDateTime>;
}

impl StartEndDateTime {
    fn instant(dt: DateTime<Utc>) -> Self {
        Self { start: dt, end: dt }
    }
}

/// Naive datetimes are taken to be UTC.
impl AnyDateTime for NaiveDateTime {
    fn get_datetime_range(self) -> Option<StartEndDateTime> {
        Some(StartEndDateTime::instant(self.and_utc()))
    }
}

impl<Tz: TimeZone> AnyDateTime for DateTime<Tz> {
    fn get_datetime_range(self) -> Option<StartEndDateTime> {
        Some(StartEndDateTime::instant(self.with_timezone(&Utc)))
    }
}

impl AnyDateTime for NaiveDate {
    fn get_datetime_range(self) -> Option<StartEndDateTime> {
        let start = Utc.from_utc_datetime(&self.and_hms_opt(0, 0, 0)?);
        let end = Utc.from_utc_datetime(&self.and_hms_opt(23, 59, 59)?);
        Some(StartEndDateTime { start, end })
    }
}

impl AnyDateTime for &str {
    fn get_datetime_range(self) -> Option<StartEndDateTime> {
        // RFC 3339, `Z` included, carries its own offset.
        if let Ok(dt) = DateTime::parse_from_rfc3339(self) {
            return dt.get_datetime_range();
        }
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(self, format).ok())
            .and_then(NaiveDateTime::get_datetime_range)
            .or_else(|| {
                NaiveDate::parse_from_str(self, "%Y-%m-%d")
                    .ok()
                    .and_then(NaiveDate::get_datetime_range)
            })
    }
}

impl AnyDateTime for String {
    fn get_datetime_range(self) -> Option<StartEndDateTime> {
        self.as_str().get_datetime_range()
    }
}

/// A closed interval `[start, end]` of UTC instants, truncated to whole seconds.
///
/// Readings produced for a span always satisfy `start <= timestamp <= end`.
///
/// # Examples
///
/// ```
/// use irceline::TimeSpan;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let span = TimeSpan::new(day, day).unwrap();
/// assert_eq!(span.to_query_param(), "2024-03-01T00:00:00Z/2024-03-01T23:59:59Z");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSpan {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSpan {
    /// Resolves `start` and `end` and checks that they are ordered.
    ///
    /// The span length is checked separately by [`TimeSpan::ensure_max_days`],
    /// since the limit comes from configuration.
    pub fn new(start: impl AnyDateTime, end: impl AnyDateTime) -> Result<Self, ConfigError> {
        let start = start
            .get_datetime_range()
            .ok_or_else(|| ConfigError::UnresolvableDate("start".to_string()))?
            .start;
        let end = end
            .get_datetime_range()
            .ok_or_else(|| ConfigError::UnresolvableDate("end".to_string()))?
            .end;
        Self::from_instants(start, end)
    }

    /// Like [`TimeSpan::new`] but for user-entered strings, keeping the text in the error.
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        let start_dt = start
            .get_datetime_range()
            .ok_or_else(|| ConfigError::UnresolvableDate(start.to_string()))?
            .start;
        let end_dt = end
            .get_datetime_range()
            .ok_or_else(|| ConfigError::UnresolvableDate(end.to_string()))?
            .end;
        Self::from_instants(start_dt, end_dt)
    }

    fn from_instants(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConfigError> {
        let start = truncate_to_second(start);
        let end = truncate_to_second(end);
        if start > end {
            return Err(ConfigError::InvertedSpan { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whole days between start and end.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Rejects spans longer than `max_days` whole days.
    pub fn ensure_max_days(&self, max_days: i64) -> Result<(), ConfigError> {
        let days = self.days();
        if days > max_days {
            return Err(ConfigError::SpanTooLong { days, max_days });
        }
        Ok(())
    }

    /// Renders the span as the `timespan` query parameter, `start/end`.
    pub fn to_query_param(&self) -> String {
        format!(
            "{}/{}",
            self.start.format(TIMESPAN_FORMAT),
            self.end.format(TIMESPAN_FORMAT)
        )
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_param())
    }
}

fn truncate_to_second(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
