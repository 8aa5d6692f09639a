//! One unit of generation work.
//!
//! A [`CanvasTask`] carries everything a worker needs to produce one output
//! image: the chosen element files, the sampled canvas sizing parameters,
//! and a derived RNG seed. The task pipeline loads the elements, sizes the
//! canvas, packs the elements, composes and binarizes the raster, builds
//! the annotation record, and writes both artifacts. Artifacts are written
//! only after every earlier stage succeeds, so an abandoned or failed task
//! leaves no partial files behind.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::core::constants::{ANNOTATION_EXTENSION, IMAGE_EXTENSION};
use crate::core::executor::TaskHandle;
use crate::core::{DatagenError, DatagenResult, GenerationStage};
use crate::processors::{PlacedElement, Rect, compose_canvas, place_rects, sketch_binarize};

use super::annotation::AnnotationRecord;
use super::elements::{SourceElement, load_elements};

/// One unit of generation work, consumed exactly once.
#[derive(Debug, Clone)]
pub struct CanvasTask {
    /// Output file stem shared by the image and annotation artifacts.
    pub stem: String,
    /// Chosen element files, in placement order.
    pub element_paths: Vec<PathBuf>,
    /// Canvas area inflation factor for this task.
    pub area_factor: f64,
    /// Output side to fall back to when the raw canvas exceeds the ceiling.
    pub fallback_side: u32,
    /// Raw canvas side lengths above this ceiling trigger the fallback.
    pub canvas_ceiling: u32,
    /// Seed of the task-local random source.
    pub seed: u64,
}

/// Canvas sizing decision for one task.
///
/// The raw side makes room for the summed element area times the inflation
/// factor. When the raw canvas grows past the ceiling, the output is
/// downsampled to the task's fallback side; otherwise output and raw side
/// coincide and no downsampling happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasPlan {
    /// Side length of the raw packing canvas.
    pub raw_side: u32,
    /// Side length of the final output image.
    pub output_side: u32,
}

impl CanvasPlan {
    /// Computes the sizing plan from the summed element pixel area.
    ///
    /// # Arguments
    ///
    /// * `total_element_area` - Sum of the chosen elements' pixel areas.
    /// * `area_factor` - Canvas area inflation factor.
    /// * `ceiling` - Raw side length above which the fallback applies.
    /// * `fallback_side` - Output side used when the ceiling is exceeded.
    pub fn from_total_area(
        total_element_area: u64,
        area_factor: f64,
        ceiling: u32,
        fallback_side: u32,
    ) -> Self {
        let canvas_area = total_element_area as f64 * area_factor;
        let raw_side = canvas_area.sqrt().round() as u32;

        let output_side = if raw_side > ceiling {
            fallback_side
        } else {
            raw_side
        };

        Self {
            raw_side,
            output_side,
        }
    }

    /// Ratio between raw and output coordinates.
    pub fn resize_factor(&self) -> f64 {
        f64::from(self.raw_side) / f64::from(self.output_side)
    }

    /// Maps a raw-canvas rectangle into output coordinates, truncating to
    /// integer pixels.
    pub fn rescale(&self, rect: &Rect) -> (u32, u32, u32, u32) {
        let factor = self.resize_factor();
        (
            (f64::from(rect.xmin()) / factor) as u32,
            (f64::from(rect.ymin()) / factor) as u32,
            (f64::from(rect.xmax()) / factor) as u32,
            (f64::from(rect.ymax()) / factor) as u32,
        )
    }
}

impl CanvasTask {
    /// Path of the image artifact under `image_dir`.
    pub fn image_path(&self, image_dir: &Path) -> PathBuf {
        image_dir.join(format!("{}.{IMAGE_EXTENSION}", self.stem))
    }

    /// Path of the annotation artifact under `annotations_dir`.
    pub fn annotation_path(&self, annotations_dir: &Path) -> PathBuf {
        annotations_dir.join(format!("{}.{ANNOTATION_EXTENSION}", self.stem))
    }

    /// Runs the full per-canvas pipeline and writes both artifacts.
    ///
    /// The placement step retries forever on geometry that cannot fit, so
    /// callers run tasks under the executor's deadline. A task whose handle
    /// was abandoned while it rendered writes nothing.
    ///
    /// # Arguments
    ///
    /// * `image_dir` - Directory the image artifact is written to.
    /// * `annotations_dir` - Directory the annotation artifact is written
    ///   to.
    /// * `handle` - The executor handle carrying the abandonment flag.
    ///
    /// # Errors
    ///
    /// Returns the first [`DatagenError`] from element loading, encoding,
    /// or artifact writing.
    pub fn run(
        &self,
        image_dir: &Path,
        annotations_dir: &Path,
        handle: &TaskHandle,
    ) -> DatagenResult<()> {
        debug!(task = %self.stem, elements = self.element_paths.len(), "starting task");

        let sources = load_elements(&self.element_paths)?;
        let (record, raster) = self.render(&sources)?;

        if handle.is_abandoned() {
            debug!(task = %self.stem, "task was abandoned, discarding artifacts");
            return Ok(());
        }

        raster
            .save(self.image_path(image_dir))
            .map_err(|error| {
                DatagenError::processing(GenerationStage::ArtifactWrite, &self.stem, error)
            })?;
        record.write_to(&self.annotation_path(annotations_dir))?;

        debug!(task = %self.stem, "task finished");
        Ok(())
    }

    /// Places, composes, and annotates the loaded elements.
    fn render(
        &self,
        sources: &[SourceElement],
    ) -> DatagenResult<(AnnotationRecord, image::RgbImage)> {
        if sources.is_empty() {
            return Err(DatagenError::invalid_input(format!(
                "task {} has no elements",
                self.stem
            )));
        }

        let mut rects: Vec<Rect> = sources
            .iter()
            .map(|source| {
                let (width, height) = source.image.dimensions();
                Rect::from_size(width, height)
            })
            .collect();

        let total_area: u64 = rects.iter().map(Rect::area).sum();
        let plan = CanvasPlan::from_total_area(
            total_area,
            self.area_factor,
            self.canvas_ceiling,
            self.fallback_side,
        );

        let canvas = Rect::from_size(plan.raw_side, plan.raw_side);
        let mut rng = SmallRng::seed_from_u64(self.seed);
        place_rects(&mut rects, &canvas, &mut rng);

        let placed: Vec<PlacedElement> = sources
            .iter()
            .zip(rects.iter())
            .map(|(source, rect)| PlacedElement {
                image: source.image.clone(),
                label: source.label.clone(),
                rect: *rect,
            })
            .collect();

        let mut record = AnnotationRecord::new(&self.stem, plan.output_side);
        for element in &placed {
            record.add_object(&element.label, plan.rescale(&element.rect));
        }

        let composed = compose_canvas(&placed, plan.raw_side);
        let raster = sketch_binarize(&composed, plan.output_side);

        Ok((record, raster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn test_plan_without_downsampling() {
        // 100 elements-pixels * factor 4 = side 20.
        let plan = CanvasPlan::from_total_area(100, 4.0, 800, 700);
        assert_eq!(plan.raw_side, 20);
        assert_eq!(plan.output_side, 20);
        assert_eq!(plan.resize_factor(), 1.0);
    }

    #[test]
    fn test_plan_falls_back_above_ceiling() {
        // 400_000 * 2.25 = 900_000, side 949 > 800.
        let plan = CanvasPlan::from_total_area(400_000, 2.25, 800, 640);
        assert_eq!(plan.raw_side, 949);
        assert_eq!(plan.output_side, 640);
        assert!(plan.resize_factor() > 1.0);
    }

    #[test]
    fn test_rescale_round_trips_within_truncation_error() {
        let plan = CanvasPlan {
            raw_side: 1000,
            output_side: 640,
        };
        let factor = plan.resize_factor();

        let mut rect = Rect::from_size(120, 80);
        rect.set_position(333, 501);
        let (xmin, ymin, xmax, ymax) = plan.rescale(&rect);

        for (scaled, original) in [
            (xmin, rect.xmin()),
            (ymin, rect.ymin()),
            (xmax, rect.xmax()),
            (ymax, rect.ymax()),
        ] {
            let recovered = (f64::from(scaled) * factor).round() as i64;
            assert!(
                (recovered - i64::from(original)).abs() <= factor.ceil() as i64,
                "recovered {recovered} too far from {original}"
            );
        }
    }

    #[test]
    fn test_identity_plan_rescale_is_exact() {
        let plan = CanvasPlan {
            raw_side: 500,
            output_side: 500,
        };
        let mut rect = Rect::from_size(40, 60);
        rect.set_position(17, 23);
        assert_eq!(plan.rescale(&rect), (17, 23, 57, 83));
    }

    fn element(width: u32, height: u32, label: &str) -> SourceElement {
        SourceElement {
            image: ImageBuffer::from_pixel(width, height, Rgb([0, 0, 0])),
            label: label.to_string(),
        }
    }

    fn test_task(count: usize) -> CanvasTask {
        CanvasTask {
            stem: "UISketch-000000000".to_string(),
            element_paths: (0..count)
                .map(|i| PathBuf::from(format!("{i}.jpg")))
                .collect(),
            area_factor: 3.0,
            fallback_side: 700,
            canvas_ceiling: 800,
            seed: 5,
        }
    }

    #[test]
    fn test_render_annotates_every_element_in_order() {
        let task = test_task(3);
        let sources = vec![
            element(30, 20, "button"),
            element(10, 10, "checkbox"),
            element(25, 15, "slider"),
        ];

        let (record, raster) = task.render(&sources).unwrap();
        assert_eq!(record.objects.len(), 3);
        assert_eq!(record.objects[0].name, "button");
        assert_eq!(record.objects[1].name, "checkbox");
        assert_eq!(record.objects[2].name, "slider");
        assert_eq!(raster.width(), record.width);
        assert_eq!(raster.height(), record.height);
    }

    #[test]
    fn test_render_rejects_empty_tasks() {
        let task = test_task(0);
        assert!(task.render(&[]).is_err());
    }

    #[test]
    fn test_render_is_reproducible_for_a_seed() {
        let task = test_task(2);
        let sources = vec![element(20, 20, "button"), element(12, 8, "label")];

        let (first, _) = task.render(&sources).unwrap();
        let (second, _) = task.render(&sources).unwrap();
        assert_eq!(first, second);
    }
}
