use image::{Rgba, RgbaImage};
use itertools::{Itertools, MinMaxResult};
use ndarray::Array2;
use num_traits::ToPrimitive;

use crate::components::raster::{GeoRaster, Sample};
use crate::errors::{RasterclipError, Result};

impl<T: Sample> GeoRaster<T> {
    /// Render as an opaque 8 bit RGBA image: a single band is
    /// replicated to gray, three bands pass through. Samples are
    /// min-max normalized over the whole raster, per band.
    pub fn to_image(&self) -> Result<RgbaImage> {
        match self.band_count() {
            1 => {
                let band = self.normalized_band(0)?;
                Ok(compose(&band, &band, &band))
            }
            3 => {
                let red = self.normalized_band(0)?;
                let green = self.normalized_band(1)?;
                let blue = self.normalized_band(2)?;
                Ok(compose(&red, &green, &blue))
            }
            bands => Err(RasterclipError::UnsupportedBandCount(bands)),
        }
    }

    /// Like [`GeoRaster::to_image`] but mapping the single band through
    /// `colormap`, a function from normalized `[0, 1]` values to rgb.
    pub fn to_image_with<F>(&self, colormap: F) -> Result<RgbaImage>
    where
        F: Fn(f64) -> [u8; 3],
    {
        if self.band_count() != 1 {
            return Err(RasterclipError::UnsupportedBandCount(self.band_count()));
        }
        let band = self.normalized_band(0)?;
        let (height, width) = band.dim();
        Ok(RgbaImage::from_fn(width as u32, height as u32, |x, y| {
            let [red, green, blue] = colormap(band[(y as usize, x as usize)]);
            Rgba([red, green, blue, u8::MAX])
        }))
    }

    /// Band samples min-max normalized to `[0, 1]` across the whole
    /// raster. A constant band normalizes to zero.
    fn normalized_band(&self, band: usize) -> Result<Array2<f64>> {
        let samples = self
            .read_band_window(band, &self.full_window())?
            .mapv(|sample| sample.to_f64().unwrap_or(f64::NAN));
        let range = samples.iter().copied().filter(|value| value.is_finite()).minmax();
        let (min, max) = match range {
            MinMaxResult::NoElements => (0., 0.),
            MinMaxResult::OneElement(value) => (value, value),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        Ok(samples.mapv(|value| {
            if !value.is_finite() || min == max {
                0.
            } else {
                (value - min) / (max - min)
            }
        }))
    }
}

fn compose(red: &Array2<f64>, green: &Array2<f64>, blue: &Array2<f64>) -> RgbaImage {
    let (height, width) = red.dim();
    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let index = (y as usize, x as usize);
        Rgba([
            to_channel(red[index]),
            to_channel(green[index]),
            to_channel(blue[index]),
            u8::MAX,
        ])
    })
}

fn to_channel(normalized: f64) -> u8 {
    (normalized.clamp(0., 1.) * 255.).round() as u8
}
