use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading the region boundary dataset. These are fatal at startup.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Failed to read region dataset '{0}'")]
    DatasetRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse region dataset as GeoJSON")]
    DatasetParse(#[from] geojson::Error),

    #[error("Region dataset is not a GeoJSON FeatureCollection")]
    NotAFeatureCollection,

    #[error("Region '{region}' has unsupported geometry; expected Polygon or MultiPolygon")]
    UnsupportedGeometry { region: String },

    #[error("Region '{region}' contains a ring with fewer than 4 positions")]
    DegenerateRing { region: String },

    #[error("None of the requested regions {requested:?} were found in the dataset")]
    EmptyRegion { requested: Vec<String> },
}
