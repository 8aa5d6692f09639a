//! The labeled element pool.
//!
//! Element sketches live in a directory tree with one subdirectory per
//! label; the label set is the sorted list of subdirectory names. The pool
//! is scanned once at startup, shared read-only across all generation
//! workers, and sampled per task.

use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::info;

use crate::core::{DatagenError, DatagenResult, GenerationStage};
use crate::utils::load_images_batch;

/// Extensions recognized as element sketch images.
const ELEMENT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// One element sketch file and the label of its subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFile {
    /// Path of the sketch image.
    pub path: PathBuf,
    /// Label, taken from the parent directory name.
    pub label: String,
}

/// A loaded element sketch.
#[derive(Debug, Clone)]
pub struct SourceElement {
    /// Decoded pixels of the sketch.
    pub image: RgbImage,
    /// Label of the element.
    pub label: String,
}

/// The read-only pool of labeled element sketches.
#[derive(Debug, Clone)]
pub struct ElementPool {
    root: PathBuf,
    labels: Vec<String>,
    files: Vec<ElementFile>,
}

impl ElementPool {
    /// Scans a labeled directory tree into an element pool.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory containing one subdirectory per label.
    ///
    /// # Errors
    ///
    /// Returns [`DatagenError::InvalidInput`] if `root` is not a directory,
    /// contains no label subdirectories, or contains no element images.
    pub fn scan(root: &Path) -> DatagenResult<Self> {
        if !root.is_dir() {
            return Err(DatagenError::invalid_input(format!(
                "element directory {} does not exist",
                root.display()
            )));
        }

        let mut labels = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                labels.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        labels.sort();

        if labels.is_empty() {
            return Err(DatagenError::invalid_input(format!(
                "element directory {} contains no label subdirectories",
                root.display()
            )));
        }

        let mut files = Vec::new();
        for label in &labels {
            let mut label_files = Vec::new();
            for entry in std::fs::read_dir(root.join(label))? {
                let path = entry?.path();
                if path.is_file() && has_element_extension(&path) {
                    label_files.push(path);
                }
            }
            label_files.sort();
            files.extend(label_files.into_iter().map(|path| ElementFile {
                path,
                label: label.clone(),
            }));
        }

        if files.is_empty() {
            return Err(DatagenError::invalid_input(format!(
                "element directory {} contains no element images",
                root.display()
            )));
        }

        info!(
            labels = labels.len(),
            elements = files.len(),
            "scanned element pool at {}",
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            labels,
            files,
        })
    }

    /// Root directory of the pool.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorted label set of the pool.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// All element files in the pool, grouped by label.
    pub fn files(&self) -> &[ElementFile] {
        &self.files
    }

    /// Number of element files in the pool.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the pool holds no element files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn has_element_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ELEMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Loads the chosen element files of one task.
///
/// The label of each element is derived from its parent directory, matching
/// the pool layout. Batches above the parallel threshold load on the rayon
/// pool.
///
/// # Errors
///
/// Returns a [`GenerationStage::ElementLoad`] processing error wrapping the
/// first decode failure.
pub fn load_elements(paths: &[PathBuf]) -> DatagenResult<Vec<SourceElement>> {
    let images = load_images_batch(paths).map_err(|error| {
        DatagenError::processing(
            GenerationStage::ElementLoad,
            "loading chosen element sketches",
            error,
        )
    })?;

    Ok(images
        .into_iter()
        .zip(paths)
        .map(|(image, path)| SourceElement {
            image,
            label: label_of(path),
        })
        .collect())
}

/// Label of an element file: the name of its parent directory.
pub fn label_of(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "uisketch-elements-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_element(dir: &Path, label: &str, name: &str) {
        let label_dir = dir.join(label);
        std::fs::create_dir_all(&label_dir).unwrap();
        let image: RgbImage = ImageBuffer::from_pixel(4, 4, Rgb([0, 0, 0]));
        image.save(label_dir.join(name)).unwrap();
    }

    #[test]
    fn test_scan_sorts_labels_and_collects_files() {
        let dir = scratch_dir("scan");
        write_element(&dir, "slider", "a.jpg");
        write_element(&dir, "button", "b.jpg");
        write_element(&dir, "button", "a.jpg");

        let pool = ElementPool::scan(&dir).unwrap();
        assert_eq!(pool.labels(), ["button", "slider"]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.files()[0].label, "button");
        assert_eq!(pool.files()[2].label, "slider");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_ignores_stray_files() {
        let dir = scratch_dir("stray");
        write_element(&dir, "checkbox", "a.jpg");
        std::fs::write(dir.join("notes.txt"), "not a label").unwrap();
        std::fs::write(dir.join("checkbox").join("readme.md"), "skip me").unwrap();

        let pool = ElementPool::scan(&dir).unwrap();
        assert_eq!(pool.labels(), ["checkbox"]);
        assert_eq!(pool.len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_rejects_missing_and_empty_trees() {
        let dir = scratch_dir("empty");
        assert!(ElementPool::scan(&dir.join("missing")).is_err());
        assert!(ElementPool::scan(&dir).is_err());

        std::fs::create_dir_all(dir.join("button")).unwrap();
        assert!(ElementPool::scan(&dir).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_elements_carries_labels() {
        let dir = scratch_dir("load");
        write_element(&dir, "dropdown", "a.jpg");
        write_element(&dir, "dropdown", "b.jpg");

        let pool = ElementPool::scan(&dir).unwrap();
        let paths: Vec<PathBuf> = pool.files().iter().map(|f| f.path.clone()).collect();
        let elements = load_elements(&paths).unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements.iter().all(|e| e.label == "dropdown"));
        assert_eq!(elements[0].image.dimensions(), (4, 4));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
