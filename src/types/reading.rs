//! Row types produced by the aggregation pipeline.

use crate::types::pollutant::Pollutant;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Rendering of timestamps in readings and frames.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single measurement of one pollutant at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub city: String,
    pub station_id: String,
    pub lat: f64,
    pub lon: f64,
    pub pollutant: Pollutant,
    /// Measurement time in UTC, whole seconds.
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Reading {
    /// The timestamp rendered as `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp.and_utc()
    }
}

/// One city's rollup for a single pollutant, see [`crate::aggregate_by_city`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAggregate {
    pub city: String,
    pub value: f64,
    pub lat_mean: f64,
    pub lon_mean: f64,
    /// Distinct stations that contributed readings.
    pub nb_stations: u32,
}

/// One city's rollup for a pollutant at one timestamp, see [`crate::aggregate_by_city_time`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityTimeAggregate {
    pub city: String,
    pub pollutant: Pollutant,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub nb_stations: u32,
}
