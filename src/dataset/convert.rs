//! Conversion of VOC annotations to tabular label files.
//!
//! Flattens every annotation in the `annotations/` directory into rows of
//! `{filename, width, height, class, xmin, ymin, xmax, ymax}`, writes the
//! full label CSV, and splits the rows into train/test CSVs. The split is
//! grouped by filename so that all objects of one canvas land on the same
//! side of the split.
//!
//! An annotation file that fails to parse is reported and skipped; unlike
//! the resume scan, a corrupt annotation cannot misnumber future outputs,
//! so the conversion keeps going.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::Event;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::constants::ANNOTATION_EXTENSION;
use crate::core::{DatagenError, DatagenResult};

/// One flattened annotation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRow {
    /// Image file name the row belongs to.
    pub filename: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Class name of the object.
    pub class: String,
    /// Left edge of the bounding box.
    pub xmin: u32,
    /// Top edge of the bounding box.
    pub ymin: u32,
    /// Right edge of the bounding box.
    pub xmax: u32,
    /// Bottom edge of the bounding box.
    pub ymax: u32,
}

/// Summary of one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Number of annotated canvases.
    pub canvases: usize,
    /// Total label rows across all canvases.
    pub rows: usize,
    /// Rows written to the training CSV.
    pub train_rows: usize,
    /// Rows written to the test CSV.
    pub test_rows: usize,
}

/// Converts VOC annotations into the label CSVs consumed downstream.
#[derive(Debug, Clone)]
pub struct LabelConverter {
    annotations_dir: PathBuf,
    data_dir: PathBuf,
}

impl LabelConverter {
    /// Creates a converter over an annotation directory.
    pub fn new(annotations_dir: &Path, data_dir: &Path) -> Self {
        Self {
            annotations_dir: annotations_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Path of the full label CSV.
    pub fn labels_csv(&self) -> PathBuf {
        self.data_dir.join("uisketch_labels.csv")
    }

    /// Path of the training label CSV.
    pub fn train_csv(&self) -> PathBuf {
        self.data_dir.join("train_labels.csv")
    }

    /// Path of the test label CSV.
    pub fn test_csv(&self) -> PathBuf {
        self.data_dir.join("test_labels.csv")
    }

    /// Flattens every readable annotation file into label rows.
    ///
    /// Files are visited in sorted order. A file that fails to parse is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the annotation directory cannot be read.
    pub fn collect_rows(&self) -> DatagenResult<Vec<LabelRow>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.annotations_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(ANNOTATION_EXTENSION))
            })
            .collect();
        paths.sort();

        let mut rows = Vec::new();
        for path in &paths {
            match parse_annotation(path) {
                Ok(mut file_rows) => rows.append(&mut file_rows),
                Err(error) => {
                    warn!(file = %path.display(), error = %error, "skipping unreadable annotation");
                }
            }
        }
        Ok(rows)
    }

    /// Runs the full conversion: collect, write the full CSV, split, write
    /// the train/test CSVs.
    ///
    /// # Arguments
    ///
    /// * `test_split` - Fraction of canvases routed to the test CSV; must
    ///   lie in `[0, 1)`.
    /// * `rng` - Random source for the split draw.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid split ratio, or an IO
    /// error from reading annotations or writing CSVs.
    pub fn convert<R: Rng + ?Sized>(
        &self,
        test_split: f64,
        rng: &mut R,
    ) -> DatagenResult<ConversionSummary> {
        std::fs::create_dir_all(&self.data_dir)?;

        let rows = self.collect_rows()?;
        write_csv(&self.labels_csv(), &rows)?;

        let (train, test) = split_rows(rows.clone(), test_split, rng)?;
        write_csv(&self.train_csv(), &train)?;
        write_csv(&self.test_csv(), &test)?;

        let summary = ConversionSummary {
            canvases: count_canvases(&rows),
            rows: rows.len(),
            train_rows: train.len(),
            test_rows: test.len(),
        };
        info!(
            canvases = summary.canvases,
            rows = summary.rows,
            train_rows = summary.train_rows,
            test_rows = summary.test_rows,
            "label CSV files generated at {}",
            self.data_dir.display()
        );
        Ok(summary)
    }
}

/// Parses one VOC annotation file into label rows, one per object.
///
/// # Errors
///
/// Returns an error for malformed XML or non-numeric size/bounding-box
/// fields.
pub fn parse_annotation(path: &Path) -> DatagenResult<Vec<LabelRow>> {
    #[derive(Default)]
    struct ObjectDraft {
        name: String,
        xmin: u32,
        ymin: u32,
        xmax: u32,
        ymax: u32,
    }

    let mut reader = Reader::from_file(path)?;
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut filename = String::new();
    let mut width = 0u32;
    let mut height = 0u32;
    let mut in_size = false;
    let mut in_object = false;
    let mut in_bndbox = false;
    let mut draft = ObjectDraft::default();
    let mut rows = Vec::new();
    let mut current_tag: Vec<u8> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                current_tag = start.name().as_ref().to_vec();
                match current_tag.as_slice() {
                    b"size" => in_size = true,
                    b"bndbox" => in_bndbox = true,
                    b"object" => {
                        in_object = true;
                        draft = ObjectDraft::default();
                    }
                    _ => {}
                }
            }
            Event::End(end) => {
                match end.name().as_ref() {
                    b"size" => in_size = false,
                    b"bndbox" => in_bndbox = false,
                    b"object" => {
                        in_object = false;
                        rows.push(LabelRow {
                            filename: filename.clone(),
                            width,
                            height,
                            class: std::mem::take(&mut draft.name),
                            xmin: draft.xmin,
                            ymin: draft.ymin,
                            xmax: draft.xmax,
                            ymax: draft.ymax,
                        });
                    }
                    _ => {}
                }
                current_tag.clear();
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(quick_xml::Error::from)?
                    .into_owned();
                match current_tag.as_slice() {
                    b"filename" if !in_object => filename = value,
                    b"width" if in_size => width = parse_field(&value, "width", path)?,
                    b"height" if in_size => height = parse_field(&value, "height", path)?,
                    b"name" if in_object => draft.name = value,
                    b"xmin" if in_bndbox => draft.xmin = parse_field(&value, "xmin", path)?,
                    b"ymin" if in_bndbox => draft.ymin = parse_field(&value, "ymin", path)?,
                    b"xmax" if in_bndbox => draft.xmax = parse_field(&value, "xmax", path)?,
                    b"ymax" if in_bndbox => draft.ymax = parse_field(&value, "ymax", path)?,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn parse_field(value: &str, field: &str, path: &Path) -> DatagenResult<u32> {
    value.parse::<u32>().map_err(|_| {
        DatagenError::invalid_input(format!(
            "non-numeric {field} '{value}' in {}",
            path.display()
        ))
    })
}

/// Splits label rows into train/test sets, grouped by filename.
///
/// The number of test canvases is `floor(canvases * test_split)`; the
/// training canvases are drawn without replacement and both outputs keep
/// the original canvas order.
///
/// # Errors
///
/// Returns a configuration error unless `0 <= test_split < 1`.
pub fn split_rows<R: Rng + ?Sized>(
    rows: Vec<LabelRow>,
    test_split: f64,
    rng: &mut R,
) -> DatagenResult<(Vec<LabelRow>, Vec<LabelRow>)> {
    if !(0.0..1.0).contains(&test_split) {
        return Err(DatagenError::config_error(format!(
            "test split {test_split} is outside [0, 1)"
        )));
    }

    // Group rows by filename, keeping first-seen canvas order.
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<LabelRow>> = Vec::new();
    for row in rows {
        let index = *group_index
            .entry(row.filename.clone())
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[index].push(row);
    }

    let dataset_size = groups.len();
    let test_size = (dataset_size as f64 * test_split) as usize;
    let train_size = dataset_size - test_size;

    let train_indices: HashSet<usize> = rand::seq::index::sample(rng, dataset_size, train_size)
        .into_iter()
        .collect();

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (index, mut group) in groups.into_iter().enumerate() {
        if train_indices.contains(&index) {
            train.append(&mut group);
        } else {
            test.append(&mut group);
        }
    }
    Ok((train, test))
}

fn count_canvases(rows: &[LabelRow]) -> usize {
    rows.iter()
        .map(|row| row.filename.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn write_csv(path: &Path, rows: &[LabelRow]) -> DatagenResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::annotation::AnnotationRecord;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("uisketch-convert-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_annotation(dir: &Path, stem: &str, objects: &[(&str, (u32, u32, u32, u32))]) {
        let mut record = AnnotationRecord::new(stem, 640);
        for (name, bndbox) in objects {
            record.add_object(name, *bndbox);
        }
        record.write_to(&dir.join(format!("{stem}.xml"))).unwrap();
    }

    fn sample_rows(canvases: usize) -> Vec<LabelRow> {
        (0..canvases)
            .flat_map(|i| {
                (0..2).map(move |j| LabelRow {
                    filename: format!("canvas-{i}.jpg"),
                    width: 640,
                    height: 640,
                    class: "button".to_string(),
                    xmin: j,
                    ymin: 0,
                    xmax: j + 10,
                    ymax: 10,
                })
            })
            .collect()
    }

    #[test]
    fn test_round_trip_through_xml() {
        let dir = scratch_dir("roundtrip");
        write_annotation(
            &dir,
            "UISketch-000000000",
            &[("button", (1, 2, 30, 40)), ("slider", (50, 60, 70, 80))],
        );

        let rows = parse_annotation(&dir.join("UISketch-000000000.xml")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].filename, "UISketch-000000000.jpg");
        assert_eq!(rows[0].class, "button");
        assert_eq!(rows[0].width, 640);
        assert_eq!((rows[0].xmin, rows[0].ymax), (1, 40));
        assert_eq!(rows[1].class, "slider");
        assert_eq!((rows[1].xmax, rows[1].ymax), (70, 80));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_collect_skips_corrupt_files() {
        let dir = scratch_dir("corrupt");
        write_annotation(&dir, "UISketch-000000000", &[("button", (0, 0, 5, 5))]);
        std::fs::write(dir.join("UISketch-000000001.xml"), "<annotation><broken").unwrap();

        let converter = LabelConverter::new(&dir, &dir.join("data"));
        let rows = converter.collect_rows().unwrap();
        assert_eq!(rows.len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_split_never_divides_a_canvas() {
        let rows = sample_rows(10);
        let mut rng = SmallRng::seed_from_u64(5);
        let (train, test) = split_rows(rows, 0.3, &mut rng).unwrap();

        assert_eq!(train.len() + test.len(), 20);
        let train_files: HashSet<&str> = train.iter().map(|r| r.filename.as_str()).collect();
        let test_files: HashSet<&str> = test.iter().map(|r| r.filename.as_str()).collect();
        assert!(train_files.is_disjoint(&test_files));
        assert_eq!(train_files.len(), 7);
        assert_eq!(test_files.len(), 3);
    }

    #[test]
    fn test_split_ratio_validation() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(split_rows(sample_rows(4), 1.0, &mut rng).is_err());
        assert!(split_rows(sample_rows(4), -0.1, &mut rng).is_err());
        assert!(split_rows(sample_rows(4), 0.0, &mut rng).is_ok());
    }

    #[test]
    fn test_convert_writes_three_csvs() {
        let dir = scratch_dir("csvs");
        let annotations = dir.join("annotations");
        std::fs::create_dir_all(&annotations).unwrap();
        for i in 0..5 {
            write_annotation(
                &annotations,
                &format!("UISketch-00000000{i}"),
                &[("button", (0, 0, 10, 10)), ("slider", (20, 20, 40, 30))],
            );
        }

        let converter = LabelConverter::new(&annotations, &dir.join("data"));
        let mut rng = SmallRng::seed_from_u64(3);
        let summary = converter.convert(0.2, &mut rng).unwrap();

        assert_eq!(summary.canvases, 5);
        assert_eq!(summary.rows, 10);
        assert_eq!(summary.train_rows, 8);
        assert_eq!(summary.test_rows, 2);

        let labels = std::fs::read_to_string(converter.labels_csv()).unwrap();
        let mut lines = labels.lines();
        assert_eq!(
            lines.next().unwrap(),
            "filename,width,height,class,xmin,ymin,xmax,ymax"
        );
        assert_eq!(labels.lines().count(), 11);
        assert!(converter.train_csv().is_file());
        assert!(converter.test_csv().is_file());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
