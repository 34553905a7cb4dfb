//! Response bodies of the IRCELINE SOS timeseries API.
//!
//! Identifiers and timestamps are numbers in practice but strings in parts of the
//! API documentation, so both are accepted.

use crate::types::station::LatLon;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| de::Error::custom(format!("timestamp {} out of range", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid epoch timestamp '{}'", s))),
        other => Err(de::Error::custom(format!(
            "expected epoch milliseconds, got {}",
            other
        ))),
    }
}

/// One entry of `GET /stations`: a GeoJSON point feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationFeature {
    #[serde(default)]
    pub geometry: Option<StationGeometry>,
    pub properties: StationProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationGeometry {
    /// `[lon, lat, altitude?]`; individual positions may be null.
    #[serde(default)]
    pub coordinates: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationProperties {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl StationFeature {
    /// The station coordinate, if the feature carries a usable one.
    pub fn coordinate(&self) -> Option<LatLon> {
        let coordinates = &self.geometry.as_ref()?.coordinates;
        let lon = coordinates.first().copied().flatten()?;
        let lat = coordinates.get(1).copied().flatten()?;
        (lat.is_finite() && lon.is_finite()).then_some(LatLon(lat, lon))
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn label(&self) -> &str {
        &self.properties.label
    }
}

/// Body of `GET /stations/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDetails {
    pub properties: StationDetailsProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDetailsProperties {
    #[serde(default)]
    pub timeseries: BTreeMap<String, TimeseriesInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesInfo {
    pub phenomenon: Phenomenon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phenomenon {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl TimeseriesInfo {
    pub fn for_phenomenon(id: &str) -> Self {
        Self {
            phenomenon: Phenomenon { id: id.to_string() },
        }
    }
}

/// Body of `GET /timeseries/{id}/getData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesData {
    #[serde(default)]
    pub values: Vec<TimeseriesValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesValue {
    /// Milliseconds since the Unix epoch, UTC.
    #[serde(deserialize_with = "epoch_millis")]
    pub timestamp: i64,
    /// `None` when the station reported no measurement.
    #[serde(default)]
    pub value: Option<f64>,
}
