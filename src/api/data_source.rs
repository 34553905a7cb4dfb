//! The seam between the aggregation pipeline and the remote API.

use crate::api::error::FetchError;
use crate::api::responses::{StationFeature, TimeseriesInfo, TimeseriesValue};
use crate::types::time_span::TimeSpan;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read access to IRCELINE stations, their time series and measured values.
///
/// [`crate::HttpDataSource`] talks to the real API; [`crate::CachedDataSource`]
/// adds TTL caching on top of any source. Tests implement this trait with
/// in-memory fixtures.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// All stations known to the service.
    async fn list_stations(&self) -> Result<Vec<StationFeature>, FetchError>;

    /// The time series of one station, keyed by time-series id.
    async fn get_station_timeseries(
        &self,
        station_id: &str,
    ) -> Result<BTreeMap<String, TimeseriesInfo>, FetchError>;

    /// The values of one time series within `span`.
    async fn get_timeseries_values(
        &self,
        timeseries_id: &str,
        span: &TimeSpan,
    ) -> Result<Vec<TimeseriesValue>, FetchError>;
}

#[async_trait]
impl<S: DataSource + ?Sized> DataSource for Arc<S> {
    async fn list_stations(&self) -> Result<Vec<StationFeature>, FetchError> {
        (**self).list_stations().await
    }

    async fn get_station_timeseries(
        &self,
        station_id: &str,
    ) -> Result<BTreeMap<String, TimeseriesInfo>, FetchError> {
        (**self).get_station_timeseries(station_id).await
    }

    async fn get_timeseries_values(
        &self,
        timeseries_id: &str,
        span: &TimeSpan,
    ) -> Result<Vec<TimeseriesValue>, FetchError> {
        (**self).get_timeseries_values(timeseries_id, span).await
    }
}
