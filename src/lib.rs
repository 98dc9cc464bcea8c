mod components;
mod crs_geo;
mod errors;
pub mod fetch;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use components::bounds::{GeoBounds, Window};
pub use components::features::{feature_collection, Feature, FEATURE_CRS};
pub use components::raster::{GeoRaster, Sample};
pub use components::transforms::TransformerCache;
pub use crs_geo::CrsGeometry;
pub use errors::{RasterclipError, Result};

// re-exported so callers can pick a resampling kernel without a direct
// gdal dependency
pub use gdal::raster::ResampleAlg;
