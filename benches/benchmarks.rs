use criterion::{criterion_group, criterion_main, Criterion};
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;
use geo::Coord;
use proj::Proj;
use rasterclip::{GeoBounds, GeoRaster};

const SIZE: (usize, usize) = (1024, 1024);

fn mercator_raster() -> GeoRaster<f64> {
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f64, _>("", SIZE.0, SIZE.1, 1)
        .unwrap();
    dataset
        .set_geo_transform(&[0., 10., 0., 0., 0., -10.])
        .unwrap();
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(3857).unwrap())
        .unwrap();
    let samples: Vec<f64> = (0..SIZE.0 * SIZE.1).map(|index| index as f64).collect();
    let mut buffer = Buffer::new(SIZE, samples);
    dataset
        .rasterband(1)
        .unwrap()
        .write((0, 0), SIZE, &mut buffer)
        .unwrap();
    GeoRaster::from_dataset(dataset).unwrap()
}

fn wgs84_bounds() -> GeoBounds {
    let transformer = Proj::new_known_crs("EPSG:3857", "EPSG:4326", None).unwrap();
    let (x0, y0) = transformer.convert((1005., -1005.)).unwrap();
    let (x1, y1) = transformer.convert((5005., -5005.)).unwrap();
    GeoBounds::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 }, "EPSG:4326")
}

fn bench_window_for_bounds(c: &mut Criterion) {
    let mut raster = mercator_raster();
    let bounds = wgs84_bounds();
    c.bench_function("window_for_bounds", |b| {
        b.iter(|| raster.window_for_bounds(&bounds).unwrap())
    });
}

fn bench_read_window(c: &mut Criterion) {
    let mut raster = mercator_raster();
    let bounds = wgs84_bounds();
    let window = raster.window_for_bounds(&bounds).unwrap();
    c.bench_function("read_window", |b| b.iter(|| raster.read_window(&window).unwrap()));
}

criterion_group!(benches, bench_window_for_bounds, bench_read_window);
criterion_main!(benches);
