//! Defines the pollutants tracked by the aggregation pipeline and their mapping
//! to IRCELINE phenomenon identifiers.

use crate::types::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A pollutant measured by IRCELINE stations.
///
/// Every variant corresponds to exactly one phenomenon identifier of the
/// IRCELINE SOS API (see <https://geo.irceline.be/sos/api/v1/phenomena>).
/// Time series tagged with any other phenomenon are ignored by the pipeline.
///
/// # Examples
///
/// ```
/// use irceline::Pollutant;
///
/// assert_eq!(Pollutant::No2.phenomenon_id(), "8");
/// assert_eq!(Pollutant::from_phenomenon_id("5"), Some(Pollutant::Pm10));
/// assert_eq!("pm25".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    /// Particulate matter < 10 µm.
    Pm10,
    /// Particulate matter < 2.5 µm.
    Pm25,
    /// Nitrogen dioxide.
    No2,
    /// Carbon dioxide.
    Co2,
    /// Sulphur dioxide.
    So2,
}

impl Pollutant {
    /// All tracked pollutants, in display order.
    pub const ALL: [Pollutant; 5] = [
        Pollutant::Pm10,
        Pollutant::Pm25,
        Pollutant::No2,
        Pollutant::Co2,
        Pollutant::So2,
    ];

    /// The short lowercase name used in readings and frames.
    pub fn name(&self) -> &'static str {
        match self {
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm25 => "pm25",
            Pollutant::No2 => "no2",
            Pollutant::Co2 => "co2",
            Pollutant::So2 => "so2",
        }
    }

    /// The IRCELINE phenomenon identifier for this pollutant.
    pub fn phenomenon_id(&self) -> &'static str {
        match self {
            Pollutant::Pm10 => "5",
            Pollutant::Pm25 => "6001",
            Pollutant::No2 => "8",
            Pollutant::Co2 => "71",
            Pollutant::So2 => "1",
        }
    }

    /// Reverse lookup of [`Pollutant::phenomenon_id`].
    pub fn from_phenomenon_id(id: &str) -> Option<Pollutant> {
        Self::ALL.into_iter().find(|p| p.phenomenon_id() == id)
    }
}

impl FromStr for Pollutant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm10" => Ok(Pollutant::Pm10),
            // "ppm25" is how the upstream dashboard spells it.
            "pm25" | "ppm25" | "pm2.5" => Ok(Pollutant::Pm25),
            "no2" => Ok(Pollutant::No2),
            "co2" => Ok(Pollutant::Co2),
            "so2" => Ok(Pollutant::So2),
            _ => Err(ConfigError::UnknownPollutant(s.to_string())),
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phenomenon_lookup_is_bijective() {
        for pollutant in Pollutant::ALL {
            assert_eq!(
                Pollutant::from_phenomenon_id(pollutant.phenomenon_id()),
                Some(pollutant)
            );
            assert_eq!(pollutant.name().parse::<Pollutant>(), Ok(pollutant));
        }
    }

    #[test]
    fn test_unknown_phenomenon_is_ignored() {
        assert_eq!(Pollutant::from_phenomenon_id("7"), None);
        assert_eq!(Pollutant::from_phenomenon_id(""), None);
    }

    #[test]
    fn test_parse_aliases_and_errors() {
        assert_eq!("PPM25".parse::<Pollutant>(), Ok(Pollutant::Pm25));
        assert_eq!(" no2 ".parse::<Pollutant>(), Ok(Pollutant::No2));
        assert_eq!(
            "ozone".parse::<Pollutant>(),
            Err(ConfigError::UnknownPollutant("ozone".to_string()))
        );
    }
}
