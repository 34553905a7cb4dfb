use crate::region::error::RegionError;
use geo::{BoundingRect, Contains, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, Value};
use log::info;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::BTreeSet;
use std::path::Path;

/// Outlines of the three Belgian regions, keyed by `reg_name_lower_nl`.
const BELGIUM_REGIONS: &str = include_str!("../../data/regions-belgium.geojson");

/// Feature property holding the region name.
pub const REGION_NAME_PROPERTY: &str = "reg_name_lower_nl";
pub const FLEMISH_REGION: &str = "vlaams gewest";
pub const BRUSSELS_REGION: &str = "brussels hoofdstedelijk gewest";

/// One polygon of an included region, indexed by its bounding box.
#[derive(Debug, Clone)]
struct RegionPolygon {
    region: String,
    polygon: Polygon<f64>,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for RegionPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Point-in-region test against a fixed set of administrative boundaries.
///
/// Polygons are kept in an R-tree keyed by bounding box (in `[lon, lat]` order),
/// so a lookup only runs the exact containment test on polygons whose box
/// contains the point.
///
/// Points lying exactly on a polygon boundary are **not** contained
/// (`geo::Contains` semantics). Holes are honoured: with the bundled dataset the
/// Brussels-Capital region is a hole in the Flemish region.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    rtree: RTree<RegionPolygon>,
}

impl RegionFilter {
    /// Loads the bundled Belgian dataset, keeping the Flemish region and,
    /// optionally, the enclosed Brussels-Capital region.
    pub fn belgium(include_brussels: bool) -> Result<Self, RegionError> {
        Self::from_geojson_str(BELGIUM_REGIONS, &Self::default_regions(include_brussels))
    }

    /// The inclusion list used by [`RegionFilter::belgium`].
    pub fn default_regions(include_brussels: bool) -> Vec<String> {
        let mut regions = vec![FLEMISH_REGION.to_string()];
        if include_brussels {
            regions.push(BRUSSELS_REGION.to_string());
        }
        regions
    }

    /// Loads a GeoJSON feature collection from disk, see [`RegionFilter::from_geojson_str`].
    pub async fn from_path(path: &Path, include: &[String]) -> Result<Self, RegionError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RegionError::DatasetRead(path.to_path_buf(), e))?;
        Self::from_geojson_str(&json, include)
    }

    /// Parses a GeoJSON feature collection and keeps the features whose
    /// `reg_name_lower_nl` property matches one of `include` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::EmptyRegion`] if no feature matches, and
    /// [`RegionError::UnsupportedGeometry`] if a matching feature is not a
    /// `Polygon` or `MultiPolygon`. Geometries are converted into `geo` types
    /// through the `geojson` crate's `TryFrom` impls.
    pub fn from_geojson_str(json: &str, include: &[String]) -> Result<Self, RegionError> {
        let collection = match json.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection,
            _ => return Err(RegionError::NotAFeatureCollection),
        };
        let wanted: Vec<String> = include.iter().map(|r| r.to_lowercase()).collect();

        let mut polygons = Vec::new();
        for feature in collection.features {
            let Some(name) = feature
                .property(REGION_NAME_PROPERTY)
                .and_then(|value| value.as_str())
                .map(str::to_lowercase)
            else {
                continue;
            };
            if !wanted.contains(&name) {
                continue;
            }

            let Some(geometry) = feature.geometry else {
                return Err(RegionError::UnsupportedGeometry { region: name });
            };
            if has_short_position(&geometry.value) {
                return Err(RegionError::DegenerateRing { region: name });
            }
            let parts: Vec<Polygon<f64>> = match geometry.value {
                value @ Value::Polygon(_) => vec![Polygon::try_from(value)?],
                value @ Value::MultiPolygon(_) => MultiPolygon::try_from(value)?.0,
                _ => return Err(RegionError::UnsupportedGeometry { region: name }),
            };
            for polygon in parts {
                polygons.push(RegionPolygon::new(&name, polygon)?);
            }
        }

        if polygons.is_empty() {
            return Err(RegionError::EmptyRegion {
                requested: include.to_vec(),
            });
        }

        info!(
            "Loaded {} polygons for regions {:?}",
            polygons.len(),
            wanted
        );
        Ok(Self {
            rtree: RTree::bulk_load(polygons),
        })
    }

    /// Returns true iff `(lat, lon)` lies strictly inside one of the included polygons.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if !lat.is_finite() || !lon.is_finite() {
            return false;
        }
        let point = Point::new(lon, lat);
        self.rtree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .any(|candidate| candidate.polygon.contains(&point))
    }

    /// Names of the regions that were loaded, sorted.
    pub fn region_names(&self) -> Vec<String> {
        self.rtree
            .iter()
            .map(|p| p.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// True if any position has fewer than two components.
fn has_short_position(value: &Value) -> bool {
    let short = |ring: &Vec<Vec<f64>>| ring.iter().any(|position| position.len() < 2);
    match value {
        Value::Polygon(rings) => rings.iter().any(short),
        Value::MultiPolygon(polygons) => polygons.iter().flatten().any(short),
        _ => false,
    }
}

impl RegionPolygon {
    fn new(region: &str, polygon: Polygon<f64>) -> Result<Self, RegionError> {
        let degenerate = || RegionError::DegenerateRing {
            region: region.to_string(),
        };
        // A closed ring needs at least 4 positions.
        let mut rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
        if rings.any(|ring| ring.0.len() < 4) {
            return Err(degenerate());
        }
        let rect = polygon.bounding_rect().ok_or_else(degenerate)?;

        Ok(Self {
            region: region.to_string(),
            min: [rect.min().x, rect.min().y],
            max: [rect.max().x, rect.max().y],
            polygon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GHENT: (f64, f64) = (51.0543, 3.7174);
    const ANTWERP: (f64, f64) = (51.2194, 4.4025);
    const HASSELT: (f64, f64) = (50.9307, 5.3325);
    const BRUSSELS: (f64, f64) = (50.8467, 4.3525);
    const LIEGE: (f64, f64) = (50.6326, 5.5797);
    const MID_ATLANTIC: (f64, f64) = (0.0, -30.0);

    const KNOKKE: (f64, f64) = (51.35, 3.286);
    const S_GRAVENVOEREN: (f64, f64) = (50.76, 5.76);
    const SINT_MARTENS_VOEREN: (f64, f64) = (50.744, 5.812);
    const MENEN: (f64, f64) = (50.796, 3.122);
    const RONSE: (f64, f64) = (50.746, 3.60);
    const MOUSCRON: (f64, f64) = (50.7446, 3.2066);
    const COMINES: (f64, f64) = (50.7705, 2.998);
    const WARNETON: (f64, f64) = (50.753, 2.95);
    const MAASTRICHT: (f64, f64) = (50.851, 5.691);

    #[test]
    fn test_points_inside_flanders() {
        let region = RegionFilter::belgium(true).unwrap();
        for (lat, lon) in [GHENT, ANTWERP, HASSELT, BRUSSELS] {
            assert!(region.contains(lat, lon), "({lat}, {lon}) should be inside");
        }
    }

    #[test]
    fn test_points_outside_region() {
        let region = RegionFilter::belgium(true).unwrap();
        let (lat, lon) = MID_ATLANTIC;
        assert!(!region.contains(lat, lon));
        // Wallonia is in the dataset but not included.
        let (lat, lon) = LIEGE;
        assert!(!region.contains(lat, lon));
        assert!(!region.contains(f64::NAN, 4.0));
    }

    #[test]
    fn test_brussels_is_a_hole_in_flanders() {
        let without = RegionFilter::belgium(false).unwrap();
        let (lat, lon) = BRUSSELS;
        assert!(!without.contains(lat, lon));
        let (lat, lon) = GHENT;
        assert!(without.contains(lat, lon));
        assert_eq!(without.region_names(), vec![FLEMISH_REGION.to_string()]);

        let with = RegionFilter::belgium(true).unwrap();
        assert_eq!(
            with.region_names(),
            vec![BRUSSELS_REGION.to_string(), FLEMISH_REGION.to_string()]
        );
    }

    #[test]
    fn test_other_region_can_be_selected() {
        let wallonia =
            RegionFilter::from_geojson_str(BELGIUM_REGIONS, &["Waals Gewest".to_string()])
                .unwrap();
        let (lat, lon) = LIEGE;
        assert!(wallonia.contains(lat, lon));
        let (lat, lon) = GHENT;
        assert!(!wallonia.contains(lat, lon));
    }

    #[test]
    fn test_border_towns_in_flanders() {
        let flanders = RegionFilter::belgium(false).unwrap();
        // Voeren is an exclave between Wallonia and the Netherlands.
        for (lat, lon) in [KNOKKE, S_GRAVENVOEREN, SINT_MARTENS_VOEREN, MENEN, RONSE] {
            assert!(flanders.contains(lat, lon), "({lat}, {lon}) should be inside");
        }
        let (lat, lon) = MAASTRICHT;
        assert!(!flanders.contains(lat, lon));
    }

    #[test]
    fn test_walloon_border_towns_excluded() {
        let flanders = RegionFilter::belgium(true).unwrap();
        let wallonia =
            RegionFilter::from_geojson_str(BELGIUM_REGIONS, &["waals gewest".to_string()])
                .unwrap();
        // Comines-Warneton is a Walloon exclave along the French border.
        for (lat, lon) in [MOUSCRON, COMINES, WARNETON] {
            assert!(!flanders.contains(lat, lon), "({lat}, {lon}) should be outside");
            assert!(wallonia.contains(lat, lon), "({lat}, {lon}) should be Walloon");
        }
    }

    #[test]
    fn test_unknown_region_is_fatal() {
        let result = RegionFilter::from_geojson_str(BELGIUM_REGIONS, &["atlantis".to_string()]);
        assert!(matches!(result, Err(RegionError::EmptyRegion { .. })));
    }

    #[test]
    fn test_unsupported_geometry() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"reg_name_lower_nl": "spot"},
             "geometry": {"type": "Point", "coordinates": [4.0, 51.0]}}
        ]}"#;
        let result = RegionFilter::from_geojson_str(json, &["spot".to_string()]);
        assert!(matches!(
            result,
            Err(RegionError::UnsupportedGeometry { region }) if region == "spot"
        ));
    }

    #[test]
    fn test_degenerate_ring() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"reg_name_lower_nl": "sliver"},
             "geometry": {"type": "Polygon", "coordinates": [[[4.0, 51.0], [4.1, 51.0]]]}}
        ]}"#;
        let result = RegionFilter::from_geojson_str(json, &["sliver".to_string()]);
        assert!(matches!(result, Err(RegionError::DegenerateRing { .. })));
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let json = r#"{"type": "Polygon", "coordinates": [[[4.0, 51.0], [4.1, 51.0], [4.1, 51.1], [4.0, 51.0]]]}"#;
        let result = RegionFilter::from_geojson_str(json, &[FLEMISH_REGION.to_string()]);
        assert!(matches!(result, Err(RegionError::NotAFeatureCollection)));
    }

    #[test]
    fn test_malformed_dataset() {
        let result = RegionFilter::from_geojson_str("{not json", &[FLEMISH_REGION.to_string()]);
        assert!(matches!(result, Err(RegionError::DatasetParse(_))));
    }

    #[tokio::test]
    async fn test_missing_dataset_file() {
        let result = RegionFilter::from_path(
            Path::new("/nonexistent/regions.geojson"),
            &[FLEMISH_REGION.to_string()],
        )
        .await;
        assert!(matches!(result, Err(RegionError::DatasetRead(_, _))));
    }
}
