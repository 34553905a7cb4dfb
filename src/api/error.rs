use thiserror::Error;

/// A failed call to the remote IRCELINE API. Aborts the aggregation request that issued it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed response body from {url}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    // Raised by non-HTTP sources (test doubles, alternative backends).
    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}
