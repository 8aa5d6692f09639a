//! The batch orchestrator.
//!
//! Drives generation of a whole corpus: builds one [`CanvasTask`] per
//! requested output (sampling elements and canvas parameters from a master
//! random source), fans the tasks out over the deadline-aware executor, and
//! accounts for the results. The authoritative success measure is the count
//! of files actually on disk, not the task-result stream, because a task
//! abandoned mid-flight leaves no file behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::core::constants::{ANNOTATIONS_DIR, DATA_DIR, IMAGES_DIR, file_stem};
use crate::core::executor::{TaskOutcome, run_tasks};
use crate::core::{DatagenResult, GeneratorConfig};

use super::elements::ElementPool;
use super::run::GenerationRun;
use super::task::CanvasTask;

/// Summary of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of outputs requested.
    pub requested: usize,
    /// Number of output files present on disk for this run's indices.
    pub generated: usize,
    /// Number of tasks that failed with an error.
    pub failed: usize,
    /// Number of tasks abandoned on timeout.
    pub timed_out: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "generated {} of {} requested",
            self.generated, self.requested
        )
    }
}

/// The synthetic dataset generator.
///
/// Holds the element pool, the output layout, and the run configuration.
/// One instance can drive any number of consecutive `generate` calls; each
/// call resumes numbering after the outputs already on disk.
#[derive(Debug)]
pub struct SyntheticDatagen {
    pool: ElementPool,
    config: GeneratorConfig,
    image_dir: PathBuf,
    annotations_dir: PathBuf,
    data_dir: PathBuf,
}

impl SyntheticDatagen {
    /// Creates a generator over a labeled element pool.
    ///
    /// Scans the element directory, validates the configuration, and
    /// creates the output directory layout.
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory of labeled element sketches.
    /// * `output_folder` - Root of the output layout (`images/`,
    ///   `annotations/`, `data/`).
    /// * `config` - Run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid, the element tree
    /// is missing or empty, or the output layout cannot be created.
    pub fn new(
        directory: &Path,
        output_folder: &Path,
        config: GeneratorConfig,
    ) -> DatagenResult<Self> {
        config.validate()?;
        let pool = ElementPool::scan(directory)?;

        let image_dir = output_folder.join(IMAGES_DIR);
        let annotations_dir = output_folder.join(ANNOTATIONS_DIR);
        let data_dir = output_folder.join(DATA_DIR);
        std::fs::create_dir_all(&image_dir)?;
        std::fs::create_dir_all(&annotations_dir)?;
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self {
            pool,
            config,
            image_dir,
            annotations_dir,
            data_dir,
        })
    }

    /// The labels of the element pool.
    pub fn labels(&self) -> &[String] {
        self.pool.labels()
    }

    /// The image output directory.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// The annotation output directory.
    pub fn annotations_dir(&self) -> &Path {
        &self.annotations_dir
    }

    /// The tabular-label output directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Generates `limit` new outputs, each task bounded by `timeout`.
    ///
    /// Task failures and timeouts are contained: they are logged, counted,
    /// and the rest of the batch keeps running.
    ///
    /// # Arguments
    ///
    /// * `limit` - Number of new outputs to generate.
    /// * `timeout` - Per-task deadline.
    ///
    /// # Errors
    ///
    /// Returns an error only for run-level problems: a corrupt resume state
    /// or an unreadable image directory.
    pub fn generate(&self, limit: usize, timeout: Duration) -> DatagenResult<RunSummary> {
        let mut run = GenerationRun::resume(&self.image_dir, limit)?;
        let mut rng = self.master_rng();
        let tasks = self.build_tasks(&run, &mut rng);

        let workers = self.config.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        });
        info!(
            requested = limit,
            start = run.start_index(),
            workers,
            timeout_secs = timeout.as_secs_f64(),
            "dispatching generation tasks"
        );

        let image_dir = self.image_dir.clone();
        let annotations_dir = self.annotations_dir.clone();
        let labeled: Vec<(String, CanvasTask)> = tasks
            .into_iter()
            .map(|task| (task.stem.clone(), task))
            .collect();

        let outcomes = run_tasks(labeled, workers, timeout, move |task, handle| {
            task.run(&image_dir, &annotations_dir, handle)
        });

        for (offset, outcome) in outcomes.iter().enumerate() {
            let stem = file_stem(run.start_index() + offset as u64);
            match outcome {
                TaskOutcome::Completed => run.record_completed(),
                TaskOutcome::Failed(error) => {
                    warn!(task = %stem, error = %error, "task failed");
                    run.record_failed();
                }
                TaskOutcome::TimedOut => {
                    warn!(
                        task = %stem,
                        timeout_secs = timeout.as_secs_f64(),
                        "task stopped due to timeout"
                    );
                    run.record_timed_out();
                }
            }
        }

        let generated = run
            .indices()
            .filter(|&index| {
                self.image_dir
                    .join(format!("{}.jpg", file_stem(index)))
                    .is_file()
            })
            .count();

        let summary = RunSummary {
            requested: limit,
            generated,
            failed: run.failed(),
            timed_out: run.timed_out(),
        };
        info!("{summary}");
        Ok(summary)
    }

    /// Builds one task per output index, sampling from the master RNG.
    ///
    /// Sampling is independent per task: element subsets are drawn without
    /// replacement within a task, and no balancing of label frequency is
    /// attempted across tasks.
    fn build_tasks(&self, run: &GenerationRun, rng: &mut SmallRng) -> Vec<CanvasTask> {
        let (factor_low, factor_high) = self.config.area_factor_range;
        let (side_low, side_high) = self.config.fallback_side_range;

        run.indices()
            .map(|index| {
                let count = rng.random_range(self.config.min_elements..=self.config.max_elements);
                let element_paths: Vec<PathBuf> = self
                    .pool
                    .files()
                    .choose_multiple(rng, count)
                    .map(|file| file.path.clone())
                    .collect();

                CanvasTask {
                    stem: file_stem(index),
                    element_paths,
                    area_factor: rng.random_range(factor_low..=factor_high),
                    fallback_side: rng.random_range(side_low..side_high),
                    canvas_ceiling: self.config.canvas_ceiling,
                    seed: rng.random(),
                }
            })
            .collect()
    }

    fn master_rng(&self) -> SmallRng {
        match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }
}
