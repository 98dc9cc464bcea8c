//! File level glue around the remote imagery service: fetch an export
//! archive and composite its visualized rgb channels into one raster.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use gdal::{Dataset, DriverManager};
use log::{debug, warn};
use reqwest::blocking::Client;
use zip::ZipArchive;

use crate::errors::{RasterclipError, Result};

/// Channel suffixes of the visualized band files inside an export
/// archive: `download.vis-<channel>.tif`.
pub const VIS_CHANNELS: [&str; 3] = ["red", "green", "blue"];

/// Attempts before a repeatedly corrupt archive download is given up
/// on.
pub const BAD_ARCHIVE_RETRIES: usize = 3;

/// Stream `url` into `outfile`. Non-success statuses are errors.
pub fn download(url: &str, outfile: &Path) -> Result<()> {
    let mut response = Client::new().get(url).send()?.error_for_status()?;
    let mut file = File::create(outfile)?;
    io::copy(&mut response, &mut file)?;
    Ok(())
}

/// Unpack a zip archive into `dest`.
pub fn extract_archive(zip_path: &Path, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;
    archive.extract(dest)?;
    Ok(())
}

/// Download an export archive and unpack it to `work_dir/<id>`,
/// returning that directory.
///
/// The remote service occasionally serves truncated archives; those
/// are re-downloaded, up to [`BAD_ARCHIVE_RETRIES`] times.
pub fn fetch_band_archive(url: &str, id: &str, work_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(work_dir)?;
    let zip_path = work_dir.join(format!("{id}.zip"));
    let out_dir = work_dir.join(id);
    for attempt in 1..=BAD_ARCHIVE_RETRIES {
        download(url, &zip_path)?;
        match extract_archive(&zip_path, &out_dir) {
            Ok(()) => return Ok(out_dir),
            Err(RasterclipError::ZipError(error)) => {
                warn!(
                    "bad archive {} (attempt {attempt}/{BAD_ARCHIVE_RETRIES}): {error}",
                    zip_path.display()
                );
            }
            Err(error) => return Err(error),
        }
    }
    Err(RasterclipError::ArchiveRetriesExhausted(BAD_ARCHIVE_RETRIES))
}

/// Merge the single channel `download.vis-{red,green,blue}.tif` files
/// in `dir` into one 3 band byte GTiff at `out`, keeping the red
/// band's georeferencing.
pub fn merge_rgb(dir: &Path, out: &Path) -> Result<PathBuf> {
    let paths: Vec<PathBuf> = VIS_CHANNELS
        .iter()
        .map(|channel| dir.join(format!("download.vis-{channel}.tif")))
        .collect();
    let mut channels = Vec::with_capacity(paths.len());
    for path in &paths {
        if !path.exists() {
            return Err(RasterclipError::MissingBandFile(path.clone()));
        }
        channels.push(Dataset::open(path)?);
    }

    let (width, height) = channels[0].raster_size();
    for (dataset, path) in channels.iter().zip(&paths) {
        if dataset.raster_count() != 1 || dataset.raster_size() != (width, height) {
            return Err(RasterclipError::BandFileMismatch(path.clone()));
        }
    }

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut merged =
        driver.create_with_band_type::<u8, _>(out, width, height, VIS_CHANNELS.len())?;
    merged.set_geo_transform(&channels[0].geo_transform()?)?;
    merged.set_projection(&channels[0].projection())?;
    for (index, dataset) in channels.iter().enumerate() {
        let mut buffer =
            dataset
                .rasterband(1)?
                .read_as::<u8>((0, 0), (width, height), (width, height), None)?;
        merged
            .rasterband(index + 1)?
            .write((0, 0), (width, height), &mut buffer)?;
    }
    merged.flush_cache()?;
    debug!("merged {} channels into {}", VIS_CHANNELS.len(), out.display());
    Ok(out.to_path_buf())
}

/// Fetch, unpack and composite one exported image: download, extract,
/// rgb merge, then cleanup of the intermediates unless `keep_files`.
pub fn fetch_image(
    url: &str,
    id: &str,
    work_dir: &Path,
    out: &Path,
    keep_files: bool,
) -> Result<PathBuf> {
    let band_dir = fetch_band_archive(url, id, work_dir)?;
    let merged = merge_rgb(&band_dir, out)?;
    if !keep_files {
        fs::remove_file(work_dir.join(format!("{id}.zip")))?;
        for channel in VIS_CHANNELS {
            fs::remove_file(band_dir.join(format!("download.vis-{channel}.tif")))?;
        }
    }
    Ok(merged)
}
