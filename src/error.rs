use crate::api::error::FetchError;
use crate::region::error::RegionError;
use crate::types::error::ConfigError;
use polars::error::PolarsError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrcelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String),

    #[error("Unexpected data state: {0}")]
    UnexpectedData(String),

    #[error("Aggregation request was cancelled")]
    Cancelled,

    #[error("Aggregation request exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl IrcelineError {
    /// True for errors caused by the remote service rather than by the request.
    ///
    /// Presentation layers show these as a generic "data unavailable" condition.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            IrcelineError::Fetch(_) | IrcelineError::DeadlineExceeded(_)
        )
    }
}
