//! Runtime configuration of the [`crate::Irceline`] client.

use bon::Builder;
use std::path::PathBuf;
use std::time::Duration;

/// Root of the IRCELINE SOS timeseries API.
pub const BASE_URL: &str = "https://geo.irceline.be/sos/api/v1";
/// Longest allowed aggregation span, in whole days.
pub const MAX_DAYS: i64 = 31;
/// Number of cities reported by [`crate::aggregate_by_city`] by default.
pub const TOP_NB_POLLUTED_CITIES: usize = 10;
/// How long fetched responses and aggregation results stay valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
/// Stations fetched in parallel during one aggregation.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Per-request timeout of the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for an [`crate::Irceline`] client.
///
/// # Examples
///
/// ```
/// use irceline::IrcelineConfig;
/// use std::time::Duration;
///
/// let config = IrcelineConfig::builder()
///     .top_cities(5)
///     .cache_ttl(Duration::from_secs(600))
///     .include_brussels(false)
///     .build();
/// assert_eq!(config.max_days, 31);
/// assert_eq!(config.top_cities, 5);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct IrcelineConfig {
    #[builder(into, default = BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default = MAX_DAYS)]
    pub max_days: i64,
    #[builder(default = TOP_NB_POLLUTED_CITIES)]
    pub top_cities: usize,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
    #[builder(default = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    /// Include the Brussels-Capital region next to the Flemish region.
    #[builder(default = true)]
    pub include_brussels: bool,
    /// GeoJSON boundary file to use instead of the bundled Belgian regions.
    pub region_dataset: Option<PathBuf>,
}

impl Default for IrcelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
