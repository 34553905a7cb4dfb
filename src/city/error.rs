use thiserror::Error;

/// A station label that cannot be turned into a city name.
///
/// The pipeline skips such stations instead of failing the whole request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CityError {
    #[error("Station label '{0}' has no ' - ' separator")]
    MalformedLabel(String),

    #[error("Station label '{0}' has no city name after the separator")]
    EmptyCity(String),
}
