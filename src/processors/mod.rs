//! Image and geometry processing for canvas generation.
//!
//! This module contains the algorithmic middle of the pipeline:
//!
//! * `geometry` - The axis-aligned rectangle primitive
//! * `placement` - Randomized backtracking rectangle packing
//! * `compositor` - Rasterization of placed elements onto a canvas
//! * `sketch_filter` - Downsampling and sketch-style binarization

mod compositor;
mod geometry;
mod placement;
mod sketch_filter;

pub use compositor::{CANVAS_BACKGROUND, PlacedElement, compose_canvas};
pub use geometry::Rect;
pub use placement::{find_position, place_rects};
pub use sketch_filter::sketch_binarize;
