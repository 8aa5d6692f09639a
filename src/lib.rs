//! # UISketch Datagen
//!
//! A Rust library that synthesizes labeled object-detection training data
//! from individually cropped, labeled UI-element sketches. Element images
//! are packed onto blank canvases without overlap, rendered in a binary
//! sketch style, and paired with Pascal VOC ground-truth annotations.
//!
//! ## Features
//!
//! - Randomized backtracking placement with zero element overlap
//! - Canvas sizing with area slack, downsampling, and sketch binarization
//! - Pascal VOC XML annotations with exact placement ground truth
//! - Parallel batch generation with per-task timeouts and failure
//!   containment
//! - Resumable output numbering across runs
//! - Label CSV conversion with a grouped train/test split
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, constants, and the task executor
//! * [`processors`] - Geometry, placement, compositing, and binarization
//! * [`dataset`] - Element pool, annotations, orchestration, conversion
//! * [`utils`] - Image loading helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use uisketch_datagen::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeneratorConfig::new().with_seed(Some(42));
//! let datagen = SyntheticDatagen::new(
//!     Path::new("elements"),
//!     Path::new("output"),
//!     config,
//! )?;
//!
//! // Generate 100 canvases, giving each task ten seconds.
//! let summary = datagen.generate(100, Duration::from_secs(10))?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod dataset;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use uisketch_datagen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{DatagenError, DatagenResult, GeneratorConfig, init_tracing};
    pub use crate::dataset::{LabelConverter, RunSummary, SyntheticDatagen};
    pub use crate::processors::Rect;
    pub use crate::utils::load_image;
}
