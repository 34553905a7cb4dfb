use crate::api::data_source::DataSource;
use crate::api::error::FetchError;
use crate::api::responses::{StationFeature, TimeseriesInfo, TimeseriesValue};
use crate::cache::TtlCache;
use crate::types::time_span::TimeSpan;
use async_trait::async_trait;
use log::debug;
use std::collections::BTreeMap;
use std::time::Duration;

/// Wraps a [`DataSource`] with one [`TtlCache`] per endpoint.
///
/// Keys are the endpoint parameters: nothing for the station list, the station id
/// for metadata, and `(timeseries id, span)` for values. Errors pass through
/// uncached.
pub struct CachedDataSource<S> {
    inner: S,
    stations: TtlCache<(), Vec<StationFeature>>,
    station_timeseries: TtlCache<String, BTreeMap<String, TimeseriesInfo>>,
    values: TtlCache<(String, TimeSpan), Vec<TimeseriesValue>>,
}

impl<S: DataSource> CachedDataSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            stations: TtlCache::new(ttl),
            station_timeseries: TtlCache::new(ttl),
            values: TtlCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached response.
    pub async fn clear(&self) {
        self.stations.clear().await;
        self.station_timeseries.clear().await;
        self.values.clear().await;
    }
}

#[async_trait]
impl<S: DataSource> DataSource for CachedDataSource<S> {
    async fn list_stations(&self) -> Result<Vec<StationFeature>, FetchError> {
        self.stations
            .get_or_try_insert_with((), || self.inner.list_stations())
            .await
    }

    async fn get_station_timeseries(
        &self,
        station_id: &str,
    ) -> Result<BTreeMap<String, TimeseriesInfo>, FetchError> {
        self.station_timeseries
            .get_or_try_insert_with(station_id.to_string(), || {
                debug!("Metadata cache miss for station {}", station_id);
                self.inner.get_station_timeseries(station_id)
            })
            .await
    }

    async fn get_timeseries_values(
        &self,
        timeseries_id: &str,
        span: &TimeSpan,
    ) -> Result<Vec<TimeseriesValue>, FetchError> {
        self.values
            .get_or_try_insert_with((timeseries_id.to_string(), *span), || {
                self.inner.get_timeseries_values(timeseries_id, span)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::responses::{StationGeometry, StationProperties};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DataSource for CountingSource {
        async fn list_stations(&self) -> Result<Vec<StationFeature>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Unavailable("down".to_string()));
            }
            Ok(vec![StationFeature {
                geometry: Some(StationGeometry {
                    coordinates: vec![Some(3.72), Some(51.05)],
                }),
                properties: StationProperties {
                    id: "1".to_string(),
                    label: "44R701 - Gent".to_string(),
                },
            }])
        }

        async fn get_station_timeseries(
            &self,
            _station_id: &str,
        ) -> Result<BTreeMap<String, TimeseriesInfo>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BTreeMap::from([(
                "10".to_string(),
                TimeseriesInfo::for_phenomenon("8"),
            )]))
        }

        async fn get_timeseries_values(
            &self,
            _timeseries_id: &str,
            _span: &TimeSpan,
        ) -> Result<Vec<TimeseriesValue>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TimeseriesValue {
                timestamp: 1_704_067_200_000,
                value: Some(1.0),
            }])
        }
    }

    fn span(day: u32) -> TimeSpan {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        TimeSpan::new(date, date).unwrap()
    }

    #[tokio::test]
    async fn test_repeated_calls_hit_the_cache() {
        let source = CachedDataSource::new(CountingSource::default(), Duration::from_secs(60));

        source.list_stations().await.unwrap();
        source.list_stations().await.unwrap();
        source.get_station_timeseries("1").await.unwrap();
        source.get_station_timeseries("1").await.unwrap();
        source.get_timeseries_values("10", &span(1)).await.unwrap();
        source.get_timeseries_values("10", &span(1)).await.unwrap();

        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_distinct_parameters_are_distinct_keys() {
        let source = CachedDataSource::new(CountingSource::default(), Duration::from_secs(60));

        source.get_station_timeseries("1").await.unwrap();
        source.get_station_timeseries("2").await.unwrap();
        source.get_timeseries_values("10", &span(1)).await.unwrap();
        source.get_timeseries_values("10", &span(2)).await.unwrap();

        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let source = CachedDataSource::new(
            CountingSource {
                fail: true,
                ..Default::default()
            },
            Duration::from_secs(60),
        );

        assert!(source.list_stations().await.is_err());
        assert!(source.list_stations().await.is_err());
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let source = CachedDataSource::new(CountingSource::default(), Duration::from_secs(60));
        source.list_stations().await.unwrap();
        source.clear().await;
        source.list_stations().await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }
}
