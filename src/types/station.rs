//! Defines the data structures for IRCELINE measuring stations once they have been
//! located inside the region and assigned to a city.

use serde::Serialize;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use irceline::LatLon;
///
/// let ghent = LatLon(51.0543, 3.7174);
/// assert_eq!(ghent.0, 51.0543); // Latitude
/// assert_eq!(ghent.1, 3.7174); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lon(&self) -> f64 {
        self.1
    }
}

/// A station that lies inside the region and whose label resolved to a city.
///
/// This is one row of the station directory (see
/// [`crate::Irceline::station_directory`]), and the unit of work of the
/// aggregation fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationEntry {
    /// Canonical city name, as returned by [`crate::CityResolver::resolve_city`].
    pub city: String,
    /// The IRCELINE station identifier (e.g. "1112").
    pub station_id: String,
    /// The raw station label (e.g. "44R701 - Gent (Baudelostraat)").
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

impl StationEntry {
    pub fn location(&self) -> LatLon {
        LatLon(self.lat, self.lon)
    }
}
