use chrono::{DateTime, Utc};
use thiserror::Error;

/// Invalid request parameters. Always raised before any network call is made.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown aggregation function '{0}', expected one of: mean, min, max, sum")]
    UnknownAggregation(String),

    #[error("Unknown pollutant '{0}', expected one of: pm10, pm25, no2, co2, so2")]
    UnknownPollutant(String),

    #[error("Could not interpret '{0}' as a date or datetime")]
    UnresolvableDate(String),

    #[error("Start of time span ({start}) lies after its end ({end})")]
    InvertedSpan {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Please select a date range of {max_days} days or less (got {days} days)")]
    SpanTooLong { days: i64, max_days: i64 },

    #[error("Fan-out concurrency must be at least 1")]
    ZeroConcurrency,
}
