use geo::{
    unary_union, AffineOps, AffineTransform, BoundingRect, Coord, MapCoords, Polygon, Rect,
};
use ndarray::Array2;
use num_traits::ToPrimitive;

use crate::components::raster::{GeoRaster, Sample};
use crate::crs_geo::CrsGeometry;
use crate::errors::Result;

/// Canonical output crs for vectorized features.
pub const FEATURE_CRS: &str = "EPSG:4326";

/// Decimal digits kept on feature coordinates.
const COORD_PRECISION: i32 = 6;

/// Mask value carried by valid-data regions, following the GDAL mask
/// convention.
const VALID: u8 = 255;

/// A vectorized region of valid raster samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: CrsGeometry<Polygon>,
    pub value: u8,
}

impl From<&Feature> for geojson::Feature {
    fn from(feature: &Feature) -> Self {
        let geometry = geojson::Geometry::new(geojson::Value::from(feature.geometry.geometry()));
        let mut converted = geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        };
        converted.set_property("value", feature.value);
        converted
    }
}

pub fn feature_collection(features: &[Feature]) -> geojson::FeatureCollection {
    geojson::FeatureCollection {
        bbox: None,
        features: features.iter().map(geojson::Feature::from).collect(),
        foreign_members: None,
    }
}

impl<T: Sample> GeoRaster<T> {
    /// Boolean validity mask over the grid: a pixel is valid when any
    /// band carries a sample different from that band's no-data value.
    /// Bands without declared no-data count as fully valid.
    pub fn validity_mask(&self) -> Result<Array2<bool>> {
        let (width, height) = (self.width(), self.height());
        let mut mask = Array2::from_elem((height, width), false);
        for band in 0..self.band_count() {
            let Some(no_data) = self.band_no_data(band)? else {
                return Ok(Array2::from_elem((height, width), true));
            };
            let samples = self.read_band_window(band, &self.full_window())?;
            for (valid, sample) in mask.iter_mut().zip(samples.iter()) {
                if sample.to_f64() != Some(no_data) {
                    *valid = true;
                }
            }
        }
        Ok(mask)
    }

    /// Vectorize contiguous valid regions into polygons in EPSG:4326,
    /// coordinates rounded to six decimals.
    ///
    /// Recomputed from scratch on every call; regions come out in
    /// raster scan order of their top left corner.
    pub fn to_features(&self) -> Result<Vec<Feature>> {
        let mask = self.validity_mask()?;
        let transform = self.geo_transform()?;
        let pixel_to_geo = AffineTransform::new(
            transform[1],
            transform[2],
            transform[0],
            transform[4],
            transform[5],
            transform[3],
        );
        vectorize(&mask)
            .into_iter()
            .map(|region| {
                let geometry = CrsGeometry::new(self.crs(), region.affine_transform(&pixel_to_geo))
                    .with_crs(FEATURE_CRS)?;
                Ok(Feature {
                    geometry: rounded(geometry, COORD_PRECISION),
                    value: VALID,
                })
            })
            .collect()
    }
}

/// Contiguous true regions of a mask as pixel space polygons: the union
/// of the unit squares of each valid pixel. Shared edges and interior
/// holes are left to geo's boolean ops.
fn vectorize(mask: &Array2<bool>) -> Vec<Polygon> {
    let squares: Vec<Polygon> = mask
        .indexed_iter()
        .filter(|(_, valid)| **valid)
        .map(|((row, col), _)| {
            Rect::new(
                Coord {
                    x: col as f64,
                    y: row as f64,
                },
                Coord {
                    x: col as f64 + 1.,
                    y: row as f64 + 1.,
                },
            )
            .to_polygon()
        })
        .collect();
    if squares.is_empty() {
        return Vec::new();
    }
    let mut regions: Vec<Polygon> = unary_union(squares.iter()).into_iter().collect();
    regions.sort_by(|a, b| {
        scan_key(a)
            .partial_cmp(&scan_key(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    regions
}

/// `(row, col)` of a region's top left corner, for scan ordering.
fn scan_key(region: &Polygon) -> (f64, f64) {
    region
        .bounding_rect()
        .map(|rect| (rect.min().y, rect.min().x))
        .unwrap_or((f64::MAX, f64::MAX))
}

fn rounded(geometry: CrsGeometry<Polygon>, digits: i32) -> CrsGeometry<Polygon> {
    let scale = 10f64.powi(digits);
    let crs = geometry.crs().to_string();
    let rounded = geometry.into_geometry().map_coords(|Coord { x, y }| Coord {
        x: (x * scale).round() / scale,
        y: (y * scale).round() / scale,
    });
    CrsGeometry::new(crs, rounded)
}
