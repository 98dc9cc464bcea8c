//! Synthetic dataset builders shared by the unit tests. Grids live on
//! the MEM driver so tests carry no data files.

use gdal::raster::Buffer as GdalBuffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use geo::Coord;
use proj::Proj;

use crate::components::raster::GeoRaster;

/// `width` x `height` EPSG:3857 grid with 10 unit pixels, north up,
/// pixel (0, 0) anchored at (0, 0). `fill` is `(band, row, col)`.
pub fn mercator_dataset(
    width: usize,
    height: usize,
    bands: usize,
    no_data: Option<f64>,
    fill: impl Fn(usize, usize, usize) -> f64,
) -> Dataset {
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f64, _>("", width, height, bands)
        .unwrap();
    dataset
        .set_geo_transform(&[0., 10., 0., 0., 0., -10.])
        .unwrap();
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(3857).unwrap())
        .unwrap();
    for band in 0..bands {
        let samples: Vec<f64> = (0..width * height)
            .map(|index| fill(band, index / width, index % width))
            .collect();
        let mut raster_band = dataset.rasterband(band + 1).unwrap();
        if no_data.is_some() {
            raster_band.set_no_data_value(no_data).unwrap();
        }
        let mut buffer = GdalBuffer::new((width, height), samples);
        raster_band.write((0, 0), (width, height), &mut buffer).unwrap();
    }
    dataset
}

pub fn mercator_raster(
    width: usize,
    height: usize,
    bands: usize,
    no_data: Option<f64>,
    fill: impl Fn(usize, usize, usize) -> f64,
) -> GeoRaster<f64> {
    GeoRaster::from_dataset(mercator_dataset(width, height, bands, no_data, fill)).unwrap()
}

/// EPSG:4326 coordinate of an EPSG:3857 point, for driving the wgs84
/// entry points from mercator test grids.
pub fn wgs84_of(x: f64, y: f64) -> Coord {
    let transformer = Proj::new_known_crs("EPSG:3857", "EPSG:4326", None).unwrap();
    let (lon, lat) = transformer.convert((x, y)).unwrap();
    Coord { x: lon, y: lat }
}

/// Single band byte GTiff on disk, for the archive merge tests.
pub fn write_byte_tiff(
    path: &std::path::Path,
    width: usize,
    height: usize,
    fill: impl Fn(usize, usize) -> u8,
) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<u8, _>(path, width, height, 1)
        .unwrap();
    dataset
        .set_geo_transform(&[0., 10., 0., 0., 0., -10.])
        .unwrap();
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(3857).unwrap())
        .unwrap();
    let samples: Vec<u8> = (0..width * height)
        .map(|index| fill(index / width, index % width))
        .collect();
    let mut buffer = GdalBuffer::new((width, height), samples);
    dataset
        .rasterband(1)
        .unwrap()
        .write((0, 0), (width, height), &mut buffer)
        .unwrap();
    dataset.flush_cache().unwrap();
}
