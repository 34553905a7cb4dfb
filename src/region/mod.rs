pub mod error;
pub mod region_filter;
