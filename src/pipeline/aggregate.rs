use crate::api::data_source::DataSource;
use crate::api::error::FetchError;
use crate::api::responses::StationFeature;
use crate::city::city_resolver::CityResolver;
use crate::region::region_filter::RegionFilter;
use crate::types::pollutant::Pollutant;
use crate::types::reading::Reading;
use crate::types::station::StationEntry;
use crate::types::time_span::TimeSpan;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// Turns the remote station/time-series graph into a flat list of readings.
///
/// Stations are processed concurrently, at most `concurrency` at a time. The
/// first fetch error aborts the whole run: in-flight requests are dropped and
/// nothing is returned.
pub struct AggregationPipeline {
    source: Arc<dyn DataSource>,
    region: Arc<RegionFilter>,
    resolver: CityResolver,
    concurrency: usize,
}

impl AggregationPipeline {
    pub fn new(
        source: Arc<dyn DataSource>,
        region: Arc<RegionFilter>,
        resolver: CityResolver,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            region,
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    /// Replaces the city resolver, keeping source, region and concurrency.
    pub fn with_resolver(self, resolver: CityResolver) -> Self {
        Self { resolver, ..self }
    }

    pub fn region(&self) -> &RegionFilter {
        &self.region
    }

    pub fn resolver(&self) -> &CityResolver {
        &self.resolver
    }

    /// Stations inside the region with a resolvable city, sorted by city then id.
    pub async fn station_directory(&self) -> Result<Vec<StationEntry>, FetchError> {
        let stations = self.source.list_stations().await?;
        let total = stations.len();

        // The first listing of a station id wins.
        let mut seen = HashSet::new();
        let mut entries: Vec<StationEntry> = stations
            .iter()
            .filter_map(|station| self.locate(station))
            .filter(|entry| seen.insert(entry.station_id.clone()))
            .collect();
        entries.sort_by(|a, b| {
            a.city
                .cmp(&b.city)
                .then_with(|| a.station_id.cmp(&b.station_id))
        });

        info!(
            "{} of {} stations lie inside regions {:?}",
            entries.len(),
            total,
            self.region.region_names()
        );
        Ok(entries)
    }

    fn locate(&self, station: &StationFeature) -> Option<StationEntry> {
        let Some(location) = station.coordinate() else {
            debug!("Skipping station {}: no coordinate", station.id());
            return None;
        };
        if !self.region.contains(location.lat(), location.lon()) {
            return None;
        }
        match self.resolver.resolve_city(station.label()) {
            Ok(city) => Some(StationEntry {
                city,
                station_id: station.id().to_string(),
                label: station.label().to_string(),
                lat: location.lat(),
                lon: location.lon(),
            }),
            Err(e) => {
                debug!("Skipping station {}: {}", station.id(), e);
                None
            }
        }
    }

    /// All readings of tracked pollutants within `span` for stations in the region.
    pub async fn aggregate(&self, span: &TimeSpan) -> Result<Vec<Reading>, FetchError> {
        let stations = self.station_directory().await?;

        let per_station: Vec<Vec<Reading>> = stream::iter(stations.iter())
            .map(|station| self.station_readings(station, span))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        let mut readings: Vec<Reading> = per_station.into_iter().flatten().collect();
        readings.sort_by(compare_readings);
        info!(
            "Collected {} readings from {} stations for {}",
            readings.len(),
            stations.len(),
            span
        );
        Ok(readings)
    }

    async fn station_readings(
        &self,
        station: &StationEntry,
        span: &TimeSpan,
    ) -> Result<Vec<Reading>, FetchError> {
        let timeseries = self
            .source
            .get_station_timeseries(&station.station_id)
            .await?;

        let mut readings = Vec::new();
        for (timeseries_id, info) in &timeseries {
            let Some(pollutant) = Pollutant::from_phenomenon_id(&info.phenomenon.id) else {
                continue;
            };
            let values = self
                .source
                .get_timeseries_values(timeseries_id, span)
                .await?;

            for entry in values {
                let Some(value) = entry.value.filter(|v| v.is_finite()) else {
                    continue;
                };
                let Some(timestamp) = normalize_timestamp(entry.timestamp) else {
                    warn!(
                        "Dropping value of timeseries {} with out-of-range timestamp {}",
                        timeseries_id, entry.timestamp
                    );
                    continue;
                };
                if !span.contains(timestamp.and_utc()) {
                    continue;
                }
                readings.push(Reading {
                    city: station.city.clone(),
                    station_id: station.station_id.clone(),
                    lat: station.lat,
                    lon: station.lon,
                    pollutant,
                    timestamp,
                    value,
                });
            }
        }
        Ok(readings)
    }
}

/// Converts epoch milliseconds to a UTC timestamp truncated to whole seconds.
pub(crate) fn normalize_timestamp(epoch_millis: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(epoch_millis.div_euclid(1000), 0).map(|dt| dt.naive_utc())
}

fn compare_readings(a: &Reading, b: &Reading) -> Ordering {
    a.city
        .cmp(&b.city)
        .then_with(|| a.station_id.cmp(&b.station_id))
        .then_with(|| a.pollutant.cmp(&b.pollutant))
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
}
