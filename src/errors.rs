use std::path::PathBuf;

use crate::components::bounds::Window;

pub type Result<T> = std::result::Result<T, RasterclipError>;

#[derive(thiserror::Error, Debug)]
pub enum RasterclipError {
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),
    #[error(transparent)]
    ProjCreateError(#[from] proj::ProjCreateError),
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error("bounds corners are not ordered, first corner must map to the lower pixel index in both axes ({0})")]
    UnorderedBounds(String),
    #[error("window {0:?} is empty or falls outside the raster grid")]
    WindowOutOfBounds(Window),
    #[error("band {band} has GDAL type ordinal {found}, expected {expected}")]
    SampleTypeMismatch {
        band: usize,
        expected: u32,
        found: u32,
    },
    #[error("scale factor must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("raster has {0} bands, expected 1 or 3")]
    UnsupportedBandCount(usize),
    #[error("missing band file {0}")]
    MissingBandFile(PathBuf),
    #[error("band file {0} is not a single channel raster of the expected size")]
    BandFileMismatch(PathBuf),
    #[error("archive still damaged after {0} download attempts")]
    ArchiveRetriesExhausted(usize),
}
