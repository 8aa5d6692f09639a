//! Canvas composition for synthetic dataset images.
//!
//! Rasterizes placed element sketches onto a uniform white canvas. The
//! canvas side length comes from the task's sizing plan, and each element is
//! copied at the position the placement engine assigned to it.

use image::{ImageBuffer, Rgb, RgbImage, imageops};

use super::geometry::Rect;

/// Background color of every composed canvas.
pub const CANVAS_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// One element sketch with its final position on the canvas.
#[derive(Debug, Clone)]
pub struct PlacedElement {
    /// Source pixels of the cropped element sketch.
    pub image: RgbImage,
    /// Label of the element, taken from its pool subdirectory.
    pub label: String,
    /// Final position and size in raw canvas coordinates.
    pub rect: Rect,
}

/// Composes placed elements onto a fresh square canvas.
///
/// Elements are copied in input order; because placement keeps at least one
/// pixel of clearance between rectangles, the copies never contend for the
/// same pixels.
///
/// # Arguments
///
/// * `elements` - The elements to rasterize, already positioned.
/// * `side` - Side length of the square canvas in pixels.
///
/// # Returns
///
/// The composed canvas image.
pub fn compose_canvas(elements: &[PlacedElement], side: u32) -> RgbImage {
    let mut canvas = ImageBuffer::from_pixel(side, side, CANVAS_BACKGROUND);

    for element in elements {
        imageops::replace(
            &mut canvas,
            &element.image,
            i64::from(element.rect.xmin()),
            i64::from(element.rect.ymin()),
        );
    }

    canvas
}
