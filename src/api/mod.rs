pub mod cached_source;
pub mod data_source;
pub mod error;
pub mod http_source;
pub mod responses;
