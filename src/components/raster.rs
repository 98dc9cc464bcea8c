use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::Path;

use gdal::raster::{Buffer as GdalBuffer, GdalType, ResampleAlg};
use gdal::{Dataset, DriverManager, GeoTransform, GeoTransformEx};
use geo::{BoundingRect, Contains, Coord, Point, Polygon};
use log::{debug, info};
use ndarray::{Array2, Array3};
use num_traits::{NumCast, Zero};

use crate::components::bounds::{GeoBounds, Window};
use crate::components::transforms::TransformerCache;
use crate::errors::{RasterclipError, Result};

/// Sample types a raster can be opened as.
pub trait Sample:
    GdalType + Copy + PartialOrd + NumCast + Zero + Send + Sync + Debug
{
}
impl<T> Sample for T where
    T: GdalType + Copy + PartialOrd + NumCast + Zero + Send + Sync + Debug
{
}

/// Exclusive owner of a georeferenced raster dataset.
///
/// Every `apply_*` operation materializes a new dataset and swaps the
/// owned handle; the previous dataset is dropped, never mutated in
/// place. Coordinate transformers into the dataset crs are cached per
/// source crs and rebuilt when a swap changes the crs.
pub struct GeoRaster<T: Sample> {
    dataset: Dataset,
    crs: String,
    transformers: TransformerCache,
    _samples: PhantomData<T>,
}

impl<T: Sample> Debug for GeoRaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoRaster")
            .field("size", &self.dataset.raster_size())
            .field("bands", &self.band_count())
            .field("crs", &self.crs)
            .finish()
    }
}

impl<T: Sample> GeoRaster<T> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_dataset(Dataset::open(path)?)
    }

    /// Wrap an already opened dataset. Every band must carry samples of
    /// type `T`.
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        check_band_types::<T>(&dataset)?;
        let crs = dataset_crs(&dataset)?;
        let raster = Self {
            transformers: TransformerCache::new(crs.clone()),
            crs,
            dataset,
            _samples: PhantomData,
        };
        info!("opened {raster:?}");
        Ok(raster)
    }

    pub fn width(&self) -> usize {
        self.dataset.raster_size().0
    }

    pub fn height(&self) -> usize {
        self.dataset.raster_size().1
    }

    pub fn band_count(&self) -> usize {
        self.dataset.raster_count()
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.dataset.geo_transform()?)
    }

    /// No-data value of a band (0 based index), if declared.
    pub fn band_no_data(&self, band: usize) -> Result<Option<f64>> {
        Ok(self.dataset.rasterband(band + 1)?.no_data_value())
    }

    /// Window covering the whole grid.
    pub fn full_window(&self) -> Window {
        Window::new(0, 0, self.width(), self.height())
    }

    pub fn transformers(&self) -> &TransformerCache {
        &self.transformers
    }

    /// Pixel `(row, col)` under a point given in `source_crs`.
    ///
    /// Deterministic; the only side effect is populating the
    /// transformer cache for `source_crs`.
    pub fn point_to_index(&mut self, point: Coord, source_crs: &str) -> Result<(isize, isize)> {
        let transformer = self.transformers.transformer_for(source_crs)?;
        let (x, y) = transformer.convert((point.x, point.y))?;
        let inverse = self.geo_transform()?.invert()?;
        let (col, row) = inverse.apply(x, y);
        Ok((row.floor() as isize, col.floor() as isize))
    }

    /// Pixel window covering `bounds`.
    ///
    /// The first corner must land on strictly lower pixel indices than
    /// the second in both axes; anything else is rejected as
    /// [`RasterclipError::UnorderedBounds`] instead of silently
    /// producing a degenerate window.
    pub fn window_for_bounds(&mut self, bounds: &GeoBounds) -> Result<Window> {
        let (first, second) = bounds.corners();
        let (row0, col0) = self.point_to_index(first, bounds.crs())?;
        let (row1, col1) = self.point_to_index(second, bounds.crs())?;
        if col1 <= col0 || row1 <= row0 {
            return Err(RasterclipError::UnorderedBounds(format!(
                "corners resolved to rows {row0}..{row1}, cols {col0}..{col1}"
            )));
        }
        Ok(Window::new(
            col0,
            row0,
            (col1 - col0) as usize,
            (row1 - row0) as usize,
        ))
    }

    /// Samples of one band inside the window covering `bounds`,
    /// without replacing the dataset.
    pub fn read_bounds(&mut self, band: usize, bounds: &GeoBounds) -> Result<Array2<T>> {
        let window = self.window_for_bounds(bounds)?;
        self.read_band_window(band, &window)
    }

    /// Samples of one band (0 based index) inside `window`, row major.
    pub fn read_band_window(&self, band: usize, window: &Window) -> Result<Array2<T>> {
        self.check_window(window)?;
        let samples = self.read_band_raw(band, window, window.size(), None)?;
        Ok(Array2::from_shape_vec(
            (window.height, window.width),
            samples,
        )?)
    }

    /// Samples of all bands inside `window`, shaped `(band, row, col)`.
    pub fn read_window(&self, window: &Window) -> Result<Array3<T>> {
        self.check_window(window)?;
        let (width, height) = window.size();
        let mut samples = Vec::with_capacity(self.band_count() * width * height);
        for band in 0..self.band_count() {
            samples.extend_from_slice(&self.read_band_raw(band, window, window.size(), None)?);
        }
        Ok(Array3::from_shape_vec(
            (self.band_count(), height, width),
            samples,
        )?)
    }

    /// Clip the raster to `bounds` by replacing the dataset with the
    /// covered window.
    pub fn apply_bounds(&mut self, bounds: &GeoBounds) -> Result<()> {
        let window = self.window_for_bounds(bounds)?;
        self.check_window(&window)?;
        let transform = self.window_transform(&window)?;
        let bands = (0..self.band_count())
            .map(|band| self.read_band_raw(band, &window, window.size(), None))
            .collect::<Result<Vec<_>>>()?;
        let (width, height) = window.size();
        self.replace_dataset(width, height, transform, bands)
    }

    /// Resample to `round(height * factor)` x `round(width * factor)`
    /// pixels with bilinear interpolation, the acquisition scripts'
    /// default kernel.
    pub fn apply_scale(&mut self, factor: f64) -> Result<()> {
        self.apply_scale_with(factor, ResampleAlg::Bilinear)
    }

    /// Resample with a caller selected kernel.
    pub fn apply_scale_with(&mut self, factor: f64, resampling: ResampleAlg) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(RasterclipError::InvalidScale(factor));
        }
        let (width, height) = (self.width(), self.height());
        let new_width = (width as f64 * factor).round() as usize;
        let new_height = (height as f64 * factor).round() as usize;
        if new_width == 0 || new_height == 0 {
            return Err(RasterclipError::InvalidScale(factor));
        }
        let window = self.full_window();
        let bands = (0..self.band_count())
            .map(|band| self.read_band_raw(band, &window, (new_width, new_height), Some(resampling)))
            .collect::<Result<Vec<_>>>()?;
        let transform = self.geo_transform()?;
        let x_ratio = width as f64 / new_width as f64;
        let y_ratio = height as f64 / new_height as f64;
        let transform = [
            transform[0],
            transform[1] * x_ratio,
            transform[2] * y_ratio,
            transform[3],
            transform[4] * x_ratio,
            transform[5] * y_ratio,
        ];
        self.replace_dataset(new_width, new_height, transform, bands)
    }

    /// Clip to the union of `geometries`, already expressed in the
    /// dataset crs: pixels whose center falls outside are written as
    /// the band's no-data value, `T::zero()` when none is declared.
    /// With `invert`, only the outside survives instead.
    pub fn apply_features_mask(&mut self, geometries: &[Polygon], invert: bool) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        let transform = self.geo_transform()?;
        let inside = self.rasterize(geometries, &transform)?;
        let window = self.full_window();
        let mut bands = Vec::with_capacity(self.band_count());
        for band in 0..self.band_count() {
            let fill = self
                .band_no_data(band)?
                .and_then(|no_data| T::from(no_data))
                .unwrap_or_else(T::zero);
            let mut samples = self.read_band_raw(band, &window, window.size(), None)?;
            for (index, sample) in samples.iter_mut().enumerate() {
                if inside[(index / width, index % width)] == invert {
                    *sample = fill;
                }
            }
            bands.push(samples);
        }
        self.replace_dataset(width, height, transform, bands)
    }

    /// Pixel-center containment mask for a set of geometries in the
    /// dataset crs.
    fn rasterize(&self, geometries: &[Polygon], transform: &GeoTransform) -> Result<Array2<bool>> {
        let (width, height) = (self.width(), self.height());
        let inverse = transform.invert()?;
        let mut inside = Array2::from_elem((height, width), false);
        for geometry in geometries {
            let Some(rect) = geometry.bounding_rect() else {
                continue;
            };
            let (col0, row0) = inverse.apply(rect.min().x, rect.min().y);
            let (col1, row1) = inverse.apply(rect.max().x, rect.max().y);
            let row_range = pixel_range(row0, row1, height);
            let col_range = pixel_range(col0, col1, width);
            for row in row_range {
                for col in col_range.clone() {
                    if inside[(row, col)] {
                        continue;
                    }
                    let (x, y) = transform.apply(col as f64 + 0.5, row as f64 + 0.5);
                    if geometry.contains(&Point::new(x, y)) {
                        inside[(row, col)] = true;
                    }
                }
            }
        }
        Ok(inside)
    }

    fn check_window(&self, window: &Window) -> Result<()> {
        if !window.fits(self.width(), self.height()) {
            return Err(RasterclipError::WindowOutOfBounds(*window));
        }
        Ok(())
    }

    fn read_band_raw(
        &self,
        band: usize,
        window: &Window,
        out_size: (usize, usize),
        resampling: Option<ResampleAlg>,
    ) -> Result<Vec<T>> {
        let buffer = self.dataset.rasterband(band + 1)?.read_as::<T>(
            window.offset(),
            window.size(),
            out_size,
            resampling,
        )?;
        Ok(buffer.data().to_vec())
    }

    /// Geotransform re-anchored at the window origin.
    fn window_transform(&self, window: &Window) -> Result<GeoTransform> {
        let transform = self.geo_transform()?;
        let (x0, y0) = transform.apply(window.col_off as f64, window.row_off as f64);
        Ok([x0, transform[1], transform[2], y0, transform[4], transform[5]])
    }

    /// Copy-on-apply: materialize a new in-memory dataset carrying the
    /// given grid and per band samples, then swap it in as the owned
    /// handle.
    fn replace_dataset(
        &mut self,
        width: usize,
        height: usize,
        transform: GeoTransform,
        bands: Vec<Vec<T>>,
    ) -> Result<()> {
        let driver = DriverManager::get_driver_by_name("MEM")?;
        let mut dataset = driver.create_with_band_type::<T, _>("", width, height, bands.len())?;
        dataset.set_geo_transform(&transform)?;
        dataset.set_projection(&self.dataset.projection())?;
        for (index, samples) in bands.into_iter().enumerate() {
            let no_data = self.band_no_data(index)?;
            let mut band = dataset.rasterband(index + 1)?;
            if no_data.is_some() {
                band.set_no_data_value(no_data)?;
            }
            let mut buffer = GdalBuffer::new((width, height), samples);
            band.write((0, 0), (width, height), &mut buffer)?;
        }
        self.swap_dataset(dataset)
    }

    fn swap_dataset(&mut self, dataset: Dataset) -> Result<()> {
        let crs = dataset_crs(&dataset)?;
        if self.transformers.target() != crs {
            self.transformers = TransformerCache::new(crs.clone());
        }
        self.crs = crs;
        self.dataset = dataset;
        debug!("replaced dataset: {self:?}");
        Ok(())
    }
}

/// Crs identifier of a dataset: `authority:code` when known, full wkt
/// otherwise.
fn dataset_crs(dataset: &Dataset) -> Result<String> {
    let spatial_ref = dataset.spatial_ref()?;
    if let (Some(name), Ok(code)) = (spatial_ref.auth_name(), spatial_ref.auth_code()) {
        Ok(format!("{name}:{code}"))
    } else {
        Ok(spatial_ref.to_wkt()?)
    }
}

fn check_band_types<T: Sample>(dataset: &Dataset) -> Result<()> {
    for band in 1..=dataset.raster_count() {
        let found = dataset.rasterband(band)?.band_type() as u32;
        if found != T::gdal_ordinal() {
            return Err(RasterclipError::SampleTypeMismatch {
                band,
                expected: T::gdal_ordinal(),
                found,
            });
        }
    }
    Ok(())
}

/// Clamped index range touched by an unordered pair of fractional pixel
/// coordinates.
fn pixel_range(a: f64, b: f64, len: usize) -> std::ops::Range<usize> {
    let low = a.min(b).floor().max(0.0) as usize;
    let high = (a.max(b).ceil().min(len as f64)) as usize;
    low..high
}
