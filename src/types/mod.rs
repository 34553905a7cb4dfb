pub mod aggregation;
pub mod error;
pub mod pollutant;
pub mod reading;
pub mod station;
pub mod time_span;
