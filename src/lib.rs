mod api;
mod cache;
mod city;
mod config;
mod error;
mod irceline;
mod pipeline;
mod region;
mod types;

pub use config::*;
pub use error::IrcelineError;
pub use irceline::*;

pub use api::cached_source::CachedDataSource;
pub use api::data_source::DataSource;
pub use api::error::FetchError;
pub use api::http_source::HttpDataSource;
pub use api::responses::*;
pub use cache::TtlCache;

pub use city::city_resolver::CityResolver;
pub use city::error::CityError;
pub use region::error::RegionError;
pub use region::region_filter::*;

pub use pipeline::aggregate::AggregationPipeline;
pub use pipeline::readings_frame::*;

pub use types::aggregation::AggregationFunction;
pub use types::error::ConfigError;
pub use types::pollutant::Pollutant;
pub use types::reading::*;
pub use types::station::*;
pub use types::time_span::*;
