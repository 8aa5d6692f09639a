//! Run state and resumption.
//!
//! A [`GenerationRun`] is built once at startup by scanning the image output
//! directory: if previous outputs exist, the run continues from the highest
//! index plus one, so output stems stay a dense, strictly increasing
//! sequence and earlier runs are never renumbered or overwritten. The scan
//! is strict: an image file whose stem does not parse is a fatal error,
//! because resuming from an ambiguous index could silently clobber data.

use std::path::Path;

use regex::Regex;
use tracing::info;

use crate::core::constants::{FILE_STEM_PREFIX, IMAGE_EXTENSION, file_stem};
use crate::core::{DatagenError, DatagenResult};

/// Per-run generation state: where to start numbering and how the
/// dispatched tasks ended up.
#[derive(Debug, Clone)]
pub struct GenerationRun {
    start_index: u64,
    requested: usize,
    completed: usize,
    failed: usize,
    timed_out: usize,
}

impl GenerationRun {
    /// Builds the run state by scanning existing outputs.
    ///
    /// # Arguments
    ///
    /// * `image_dir` - The image output directory. It may not exist yet, in
    ///   which case the run starts at index 0.
    /// * `requested` - Number of new outputs this run should generate.
    ///
    /// # Errors
    ///
    /// Returns [`DatagenError::ResumeState`] if an image file in the
    /// directory has an unparsable stem.
    pub fn resume(image_dir: &Path, requested: usize) -> DatagenResult<Self> {
        let last_index = scan_last_index(image_dir)?;
        let start_index = match last_index {
            Some(last) => {
                info!(
                    "found existing data, continuing from {}",
                    file_stem(last + 1)
                );
                last + 1
            }
            None => 0,
        };

        Ok(Self {
            start_index,
            requested,
            completed: 0,
            failed: 0,
            timed_out: 0,
        })
    }

    /// First output index of this run.
    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// Output indices this run will generate.
    pub fn indices(&self) -> std::ops::Range<u64> {
        self.start_index..self.start_index + self.requested as u64
    }

    /// Number of outputs requested for this run.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Number of tasks that completed.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of tasks that failed.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of tasks that were abandoned on timeout.
    pub fn timed_out(&self) -> usize {
        self.timed_out
    }

    /// Records one completed task.
    pub fn record_completed(&mut self) {
        self.completed += 1;
    }

    /// Records one failed task.
    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// Records one timed-out task.
    pub fn record_timed_out(&mut self) {
        self.timed_out += 1;
    }
}

/// Scans the image directory for the highest existing output index.
///
/// Returns `None` when the directory does not exist or holds no images.
fn scan_last_index(image_dir: &Path) -> DatagenResult<Option<u64>> {
    if !image_dir.is_dir() {
        return Ok(None);
    }

    let stem_pattern = Regex::new(&format!("^{FILE_STEM_PREFIX}([0-9]+)$"))
        .map_err(|error| DatagenError::resume_state(error.to_string()))?;

    let mut last: Option<u64> = None;
    for entry in std::fs::read_dir(image_dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));
        if !path.is_file() || !is_image {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let index = stem_pattern
            .captures(stem)
            .and_then(|captures| captures[1].parse::<u64>().ok())
            .ok_or_else(|| {
                DatagenError::resume_state(format!(
                    "cannot infer resume index from {}",
                    path.display()
                ))
            })?;

        last = Some(last.map_or(index, |current| current.max(index)));
    }

    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("uisketch-run-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_fresh_directory_starts_at_zero() {
        let dir = scratch_dir("fresh");
        let run = GenerationRun::resume(&dir, 5).unwrap();
        assert_eq!(run.start_index(), 0);
        assert_eq!(run.indices().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_starts_at_zero() {
        let dir = scratch_dir("missing");
        let run = GenerationRun::resume(&dir.join("images"), 3).unwrap();
        assert_eq!(run.start_index(), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_resume_continues_after_highest_index() {
        let dir = scratch_dir("resume");
        for index in 0..10 {
            std::fs::write(dir.join(format!("{}.jpg", file_stem(index))), b"").unwrap();
        }

        let run = GenerationRun::resume(&dir, 5).unwrap();
        assert_eq!(run.start_index(), 10);
        assert_eq!(run.indices().end, 15);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_gaps_resume_past_the_maximum() {
        let dir = scratch_dir("gaps");
        std::fs::write(dir.join(format!("{}.jpg", file_stem(2))), b"").unwrap();
        std::fs::write(dir.join(format!("{}.jpg", file_stem(7))), b"").unwrap();

        let run = GenerationRun::resume(&dir, 1).unwrap();
        assert_eq!(run.start_index(), 8);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unparsable_stem_is_fatal() {
        let dir = scratch_dir("corrupt");
        std::fs::write(dir.join("UISketch-000000000.jpg"), b"").unwrap();
        std::fs::write(dir.join("vacation-photo.jpg"), b"").unwrap();

        let result = GenerationRun::resume(&dir, 1);
        assert!(matches!(result, Err(DatagenError::ResumeState { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_non_image_files_are_ignored() {
        let dir = scratch_dir("ignore");
        std::fs::write(dir.join(format!("{}.jpg", file_stem(3))), b"").unwrap();
        std::fs::write(dir.join(".DS_Store"), b"").unwrap();

        let run = GenerationRun::resume(&dir, 1).unwrap();
        assert_eq!(run.start_index(), 4);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_tallies() {
        let dir = scratch_dir("tally");
        let mut run = GenerationRun::resume(&dir, 3).unwrap();
        run.record_completed();
        run.record_failed();
        run.record_timed_out();
        assert_eq!(run.completed(), 1);
        assert_eq!(run.failed(), 1);
        assert_eq!(run.timed_out(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
