//! Utility functions for image loading and conversion.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};

use crate::core::DatagenError;
use crate::core::constants::DEFAULT_PARALLEL_THRESHOLD;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Converts a DynamicImage to a GrayImage.
pub fn dynamic_to_gray(img: DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Arguments
///
/// * `path` - The path of the image file to load.
///
/// # Errors
///
/// Returns [`DatagenError::ImageLoad`] if the file cannot be opened or
/// decoded.
pub fn load_image(path: &Path) -> Result<RgbImage, DatagenError> {
    let img = image::open(path).map_err(DatagenError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Loads a batch of images from file paths.
///
/// Batches larger than the default parallel threshold are loaded on the
/// rayon pool; smaller ones sequentially.
///
/// # Arguments
///
/// * `paths` - The paths of the image files to load.
///
/// # Errors
///
/// Returns the first [`DatagenError`] encountered while loading.
pub fn load_images_batch<P: AsRef<Path> + Send + Sync>(
    paths: &[P],
) -> Result<Vec<RgbImage>, DatagenError> {
    if paths.len() > DEFAULT_PARALLEL_THRESHOLD {
        use rayon::prelude::*;
        paths.par_iter().map(|p| load_image(p.as_ref())).collect()
    } else {
        paths.iter().map(|p| load_image(p.as_ref())).collect()
    }
}
