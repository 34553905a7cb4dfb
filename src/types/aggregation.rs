//! The closed set of aggregation functions applied to grouped readings.

use crate::types::error::ConfigError;
use polars::prelude::{col, Expr};
use std::fmt;
use std::str::FromStr;

/// How values are combined when readings are grouped (by city, or by city and timestamp).
///
/// Parse user input with [`str::parse`]; unknown names are rejected with
/// [`ConfigError::UnknownAggregation`] before any data is fetched.
///
/// # Examples
///
/// ```
/// use irceline::AggregationFunction;
///
/// let agg: AggregationFunction = "max".parse().unwrap();
/// assert_eq!(agg, AggregationFunction::Max);
/// assert!("median".parse::<AggregationFunction>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggregationFunction {
    /// Arithmetic mean of the group.
    #[default]
    Mean,
    /// Smallest value of the group.
    Min,
    /// Largest value of the group.
    Max,
    /// Sum of the group.
    Sum,
}

impl AggregationFunction {
    pub const ALL: [AggregationFunction; 4] = [
        AggregationFunction::Mean,
        AggregationFunction::Max,
        AggregationFunction::Min,
        AggregationFunction::Sum,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregationFunction::Mean => "mean",
            AggregationFunction::Min => "min",
            AggregationFunction::Max => "max",
            AggregationFunction::Sum => "sum",
        }
    }

    /// Builds the polars aggregation expression over `column`.
    ///
    /// Groups are only formed from existing rows, so an expression is never
    /// evaluated over an empty group.
    pub(crate) fn expr(&self, column: &str) -> Expr {
        match self {
            AggregationFunction::Mean => col(column).mean(),
            AggregationFunction::Min => col(column).min(),
            AggregationFunction::Max => col(column).max(),
            AggregationFunction::Sum => col(column).sum(),
        }
    }
}

impl FromStr for AggregationFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|agg| agg.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownAggregation(s.to_string()))
    }
}

impl fmt::Display for AggregationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
