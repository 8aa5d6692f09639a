//! Sketch-style binarization of composed canvases.
//!
//! The composed canvas carries the scanned-paper texture of its source
//! sketches. This filter normalizes the output into the binary ink-on-white
//! style the rest of the pipeline expects: downsample to the output
//! resolution with a smooth filter, convert to grayscale, soften with a light
//! Gaussian blur, then apply an adaptive threshold. Strokes darker than
//! their local neighborhood come out black, paper comes out white.

use image::{DynamicImage, RgbImage, imageops};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::gaussian_blur_f32;

/// Blur strength applied before thresholding.
const BLUR_SIGMA: f32 = 0.8;

/// Neighborhood radius for the adaptive threshold (an 11x11 block).
const THRESHOLD_BLOCK_RADIUS: u32 = 5;

/// Downsamples the canvas to the output side and binarizes it.
///
/// When `output_side` matches the canvas side, the downsampling step is a
/// no-op and only the binarization chain runs.
///
/// # Arguments
///
/// * `canvas` - The composed raw canvas.
/// * `output_side` - Side length of the final square output image.
///
/// # Returns
///
/// The binarized output image, dark ink on white background, in RGB so it
/// encodes to the same format as the rest of the dataset.
pub fn sketch_binarize(canvas: &RgbImage, output_side: u32) -> RgbImage {
    let resized = if canvas.width() == output_side && canvas.height() == output_side {
        canvas.clone()
    } else {
        imageops::resize(
            canvas,
            output_side,
            output_side,
            imageops::FilterType::CatmullRom,
        )
    };

    let grayscaled = DynamicImage::ImageRgb8(resized).to_luma8();
    let blurred = gaussian_blur_f32(&grayscaled, BLUR_SIGMA);
    let binary = adaptive_threshold(&blurred, THRESHOLD_BLOCK_RADIUS);

    DynamicImage::ImageLuma8(binary).to_rgb8()
}
