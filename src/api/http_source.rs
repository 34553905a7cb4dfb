use crate::api::data_source::DataSource;
use crate::api::error::FetchError;
use crate::api::responses::{
    StationDetails, StationFeature, TimeseriesData, TimeseriesInfo, TimeseriesValue,
};
use crate::types::time_span::TimeSpan;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

/// [`DataSource`] backed by the IRCELINE SOS REST API.
///
/// Every call is a single GET; non-success statuses and undecodable bodies are
/// returned as [`FetchError`]s without retrying.
pub struct HttpDataSource {
    base_url: String,
    client: Client,
}

impl HttpDataSource {
    /// Creates a source for `base_url` (e.g. `https://geo.irceline.be/sos/api/v1`)
    /// whose requests time out after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn stations_url(&self) -> String {
        format!("{}/stations", self.base_url)
    }

    pub(crate) fn station_url(&self, station_id: &str) -> String {
        format!("{}/stations/{}", self.base_url, station_id)
    }

    pub(crate) fn timeseries_data_url(&self, timeseries_id: &str, span: &TimeSpan) -> String {
        format!(
            "{}/timeseries/{}/getData?timespan={}",
            self.base_url,
            timeseries_id,
            span.to_query_param()
        )
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url, e)
                });
            }
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;
        serde_json::from_slice(&body).map_err(|source| FetchError::MalformedResponse { url, source })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn list_stations(&self) -> Result<Vec<StationFeature>, FetchError> {
        let stations: Vec<StationFeature> = self.fetch_json(self.stations_url()).await?;
        info!("Fetched {} stations from {}", stations.len(), self.base_url);
        Ok(stations)
    }

    async fn get_station_timeseries(
        &self,
        station_id: &str,
    ) -> Result<BTreeMap<String, TimeseriesInfo>, FetchError> {
        let details: StationDetails = self.fetch_json(self.station_url(station_id)).await?;
        Ok(details.properties.timeseries)
    }

    async fn get_timeseries_values(
        &self,
        timeseries_id: &str,
        span: &TimeSpan,
    ) -> Result<Vec<TimeseriesValue>, FetchError> {
        let data: TimeseriesData = self
            .fetch_json(self.timeseries_data_url(timeseries_id, span))
            .await?;
        debug!(
            "Fetched {} values for timeseries {} ({})",
            data.values.len(),
            timeseries_id,
            span
        );
        Ok(data.values)
    }
}
