//! The main entry point: an IRCELINE client scoped to a region of Belgium.
//!
//! [`Irceline`] ties together the remote data source, the region filter, the
//! city resolver and the aggregation cache.

use crate::api::cached_source::CachedDataSource;
use crate::api::data_source::DataSource;
use crate::api::http_source::HttpDataSource;
use crate::cache::TtlCache;
use crate::city::city_resolver::CityResolver;
use crate::config::IrcelineConfig;
use crate::error::IrcelineError;
use crate::pipeline::aggregate::AggregationPipeline;
use crate::pipeline::readings_frame::{aggregate_by_city, aggregate_by_city_time, ReadingsFrame};
use crate::region::region_filter::RegionFilter;
use crate::types::aggregation::AggregationFunction;
use crate::types::error::ConfigError;
use crate::types::pollutant::Pollutant;
use crate::types::reading::{CityAggregate, CityTimeAggregate, Reading};
use crate::types::station::StationEntry;
use crate::types::time_span::TimeSpan;
use bon::bon;
use log::{info, warn};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Client for regional air-quality aggregates.
///
/// Create one with [`Irceline::new()`] (bundled Flanders + Brussels boundaries,
/// live API), [`Irceline::with_config()`] or, for tests and custom back ends,
/// [`Irceline::with_source()`].
///
/// Aggregated readings are cached per [`TimeSpan`] for `cache_ttl`; the HTTP
/// responses underneath are cached per endpoint for the same duration.
///
/// # Examples
///
/// ```no_run
/// # use irceline::{Irceline, IrcelineError, Pollutant, TimeSpan};
/// # async fn run() -> Result<(), IrcelineError> {
/// let client = Irceline::new().await?;
/// let span = TimeSpan::parse("2024-01-01", "2024-01-07")?;
///
/// let top = client
///     .top_polluted_cities()
///     .span(span)
///     .pollutant(Pollutant::No2)
///     .call()
///     .await?;
/// for city in top {
///     println!("{}: {:.1} ({} stations)", city.city, city.value, city.nb_stations);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Irceline {
    config: IrcelineConfig,
    pipeline: AggregationPipeline,
    readings: TtlCache<TimeSpan, Arc<Vec<Reading>>>,
}

#[bon]
impl Irceline {
    /// Creates a client with [`IrcelineConfig::default()`].
    pub async fn new() -> Result<Self, IrcelineError> {
        Self::with_config(IrcelineConfig::default()).await
    }

    /// Creates a client talking to `config.base_url` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroConcurrency`] for a zero fan-out limit,
    /// [`IrcelineError::HttpClient`] if the HTTP client cannot be built and a
    /// [`IrcelineError::Region`] if the boundary dataset cannot be loaded.
    pub async fn with_config(config: IrcelineConfig) -> Result<Self, IrcelineError> {
        let http = HttpDataSource::new(&config.base_url, config.request_timeout)
            .map_err(IrcelineError::HttpClient)?;
        let source = CachedDataSource::new(http, config.cache_ttl);

        let region = match &config.region_dataset {
            Some(path) => {
                let include = RegionFilter::default_regions(config.include_brussels);
                RegionFilter::from_path(path, &include).await?
            }
            None => RegionFilter::belgium(config.include_brussels)?,
        };
        info!(
            "Irceline client for {} covering {:?}",
            config.base_url,
            region.region_names()
        );
        Self::with_source(config, source, region)
    }

    /// Creates a client on top of any [`DataSource`].
    ///
    /// The source is used as-is; wrap it in a [`CachedDataSource`] for response caching.
    pub fn with_source(
        config: IrcelineConfig,
        source: impl DataSource + 'static,
        region: RegionFilter,
    ) -> Result<Self, IrcelineError> {
        if config.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency.into());
        }
        let pipeline = AggregationPipeline::new(
            Arc::new(source),
            Arc::new(region),
            CityResolver::default(),
            config.concurrency,
        );
        Ok(Self {
            readings: TtlCache::new(config.cache_ttl),
            pipeline,
            config,
        })
    }

    /// Replaces the built-in label overrides.
    pub fn with_city_resolver(self, resolver: CityResolver) -> Self {
        Self {
            pipeline: self.pipeline.with_resolver(resolver),
            ..self
        }
    }

    pub fn config(&self) -> &IrcelineConfig {
        &self.config
    }

    pub fn region(&self) -> &RegionFilter {
        self.pipeline.region()
    }

    pub fn city_resolver(&self) -> &CityResolver {
        self.pipeline.resolver()
    }

    /// Every reading of a tracked pollutant within `span` for stations in the region.
    ///
    /// The span length is validated before any request is made. Results are
    /// cached per span; a failed run caches nothing.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::SpanTooLong`] when `span` exceeds `max_days`.
    /// * [`IrcelineError::Fetch`] on the first failed request; other in-flight requests are dropped.
    /// * [`IrcelineError::Cancelled`] once `cancellation` fires.
    /// * [`IrcelineError::DeadlineExceeded`] when `deadline` elapses first.
    #[builder]
    pub async fn aggregate(
        &self,
        span: TimeSpan,
        cancellation: Option<CancellationToken>,
        deadline: Option<Duration>,
    ) -> Result<Arc<Vec<Reading>>, IrcelineError> {
        span.ensure_max_days(self.config.max_days)?;

        let pipeline = &self.pipeline;
        let load = self.readings.get_or_try_insert_with(span, move || async move {
            pipeline
                .aggregate(&span)
                .await
                .map(Arc::new)
                .map_err(IrcelineError::from)
        });
        run_bounded(load, cancellation, deadline).await
    }

    /// Readings within `span` as a [`ReadingsFrame`] for custom polars queries.
    #[builder]
    pub async fn readings_frame(
        &self,
        span: TimeSpan,
        cancellation: Option<CancellationToken>,
        deadline: Option<Duration>,
    ) -> Result<ReadingsFrame, IrcelineError> {
        let readings = self
            .aggregate()
            .span(span)
            .maybe_cancellation(cancellation)
            .maybe_deadline(deadline)
            .call()
            .await?;
        ReadingsFrame::from_readings(&readings)
    }

    /// The most polluted cities for `pollutant` within `span`.
    ///
    /// `aggregation` defaults to mean and `top_n` to the configured `top_cities`.
    #[builder]
    pub async fn top_polluted_cities(
        &self,
        span: TimeSpan,
        pollutant: Pollutant,
        aggregation: Option<AggregationFunction>,
        top_n: Option<usize>,
        cancellation: Option<CancellationToken>,
        deadline: Option<Duration>,
    ) -> Result<Vec<CityAggregate>, IrcelineError> {
        let readings = self
            .aggregate()
            .span(span)
            .maybe_cancellation(cancellation)
            .maybe_deadline(deadline)
            .call()
            .await?;
        aggregate_by_city(
            &readings,
            pollutant,
            aggregation.unwrap_or_default(),
            top_n.unwrap_or(self.config.top_cities),
        )
    }

    /// Per-pollutant time series of one city within `span`.
    #[builder]
    pub async fn city_timeline(
        &self,
        span: TimeSpan,
        city: &str,
        aggregation: Option<AggregationFunction>,
        cancellation: Option<CancellationToken>,
        deadline: Option<Duration>,
    ) -> Result<Vec<CityTimeAggregate>, IrcelineError> {
        let readings = self
            .aggregate()
            .span(span)
            .maybe_cancellation(cancellation)
            .maybe_deadline(deadline)
            .call()
            .await?;
        aggregate_by_city_time(&readings, city, aggregation.unwrap_or_default())
    }

    /// Stations inside the region with a resolvable city, sorted by city then id.
    pub async fn station_directory(&self) -> Result<Vec<StationEntry>, IrcelineError> {
        Ok(self.pipeline.station_directory().await?)
    }

    /// Sorted, distinct cities that have at least one station in the region.
    pub async fn cities(&self) -> Result<Vec<String>, IrcelineError> {
        let cities: BTreeSet<String> = self
            .station_directory()
            .await?
            .into_iter()
            .map(|station| station.city)
            .collect();
        Ok(cities.into_iter().collect())
    }

    pub async fn stations_in_city(&self, city: &str) -> Result<Vec<StationEntry>, IrcelineError> {
        Ok(self
            .station_directory()
            .await?
            .into_iter()
            .filter(|station| station.city == city)
            .collect())
    }

    /// Drops cached aggregation results.
    pub async fn clear_cache(&self) {
        self.readings.clear().await;
    }
}

async fn run_bounded<T>(
    work: impl Future<Output = Result<T, IrcelineError>>,
    cancellation: Option<CancellationToken>,
    deadline: Option<Duration>,
) -> Result<T, IrcelineError> {
    let timed = async {
        match deadline {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| IrcelineError::DeadlineExceeded(limit))?,
            None => work.await,
        }
    };

    match cancellation {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    warn!("Aggregation cancelled");
                    Err(IrcelineError::Cancelled)
                }
                result = timed => result,
            }
        }
        None => timed.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::FetchError;
    use crate::api::responses::{StationFeature, TimeseriesInfo, TimeseriesValue};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    struct SlowSource;

    #[async_trait]
    impl DataSource for SlowSource {
        async fn list_stations(&self) -> Result<Vec<StationFeature>, FetchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn get_station_timeseries(
            &self,
            _station_id: &str,
        ) -> Result<BTreeMap<String, TimeseriesInfo>, FetchError> {
            Ok(BTreeMap::new())
        }

        async fn get_timeseries_values(
            &self,
            _timeseries_id: &str,
            _span: &TimeSpan,
        ) -> Result<Vec<TimeseriesValue>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn client(config: IrcelineConfig) -> Irceline {
        Irceline::with_source(config, SlowSource, RegionFilter::belgium(true).unwrap()).unwrap()
    }

    fn january() -> TimeSpan {
        TimeSpan::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let config = IrcelineConfig::builder().concurrency(0).build();
        let result = Irceline::with_source(config, SlowSource, RegionFilter::belgium(true).unwrap());
        assert!(matches!(
            result,
            Err(IrcelineError::Config(ConfigError::ZeroConcurrency))
        ));
    }

    #[tokio::test]
    async fn test_span_is_validated_before_fetching() {
        let client = client(IrcelineConfig::builder().max_days(3).build());
        // SlowSource would hang if it were called.
        let result = client.aggregate().span(january()).call().await;
        assert!(matches!(
            result,
            Err(IrcelineError::Config(ConfigError::SpanTooLong { days: 6, max_days: 3 }))
        ));
    }

    #[tokio::test]
    async fn test_cancellation() {
        let client = client(IrcelineConfig::default());
        let token = CancellationToken::new();
        token.cancel();
        let result = client
            .aggregate()
            .span(january())
            .cancellation(token)
            .call()
            .await;
        assert!(matches!(result, Err(IrcelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_deadline() {
        let client = client(IrcelineConfig::default());
        let result = client
            .aggregate()
            .span(january())
            .deadline(Duration::from_millis(50))
            .call()
            .await;
        assert!(matches!(
            result,
            Err(IrcelineError::DeadlineExceeded(d)) if d == Duration::from_millis(50)
        ));
        assert!(result.unwrap_err().is_data_unavailable());
    }

    #[tokio::test]
    async fn test_custom_resolver_is_used() {
        let client = client(IrcelineConfig::default())
            .with_city_resolver(CityResolver::new([("Gent".to_string(), "Ghent".to_string())]));
        assert_eq!(
            client.city_resolver().resolve_city("44R701 - Gent").unwrap(),
            "Ghent"
        );
        assert!(client.region().contains(51.05, 3.72));
    }
}
