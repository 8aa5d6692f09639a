//! Pascal VOC annotation records.
//!
//! One annotation record describes one generated canvas: the output image
//! size plus a `{label, bounding box}` entry per placed element, in
//! placement order. Records render to the Pascal VOC XML layout used by
//! common labeling tools, so generated and hand-labeled data stay
//! interchangeable downstream.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::constants::IMAGE_EXTENSION;
use crate::core::{DatagenError, DatagenResult, GenerationStage};

/// One labeled object inside an annotation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedObject {
    /// Class name of the object.
    pub name: String,
    /// Left edge of the bounding box, in output pixels.
    pub xmin: u32,
    /// Top edge of the bounding box, in output pixels.
    pub ymin: u32,
    /// Right edge of the bounding box, in output pixels.
    pub xmax: u32,
    /// Bottom edge of the bounding box, in output pixels.
    pub ymax: u32,
}

/// The ground-truth annotation for one generated canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Image file name the record describes (stem plus extension).
    pub filename: String,
    /// Output image width in pixels.
    pub width: u32,
    /// Output image height in pixels.
    pub height: u32,
    /// Channel count of the output image.
    pub depth: u32,
    /// Annotated objects in placement order.
    pub objects: Vec<AnnotatedObject>,
}

impl AnnotationRecord {
    /// Creates an empty record for a square output image.
    ///
    /// # Arguments
    ///
    /// * `stem` - Output file stem without extension.
    /// * `side` - Side length of the square output image.
    pub fn new(stem: &str, side: u32) -> Self {
        Self {
            filename: format!("{stem}.{IMAGE_EXTENSION}"),
            width: side,
            height: side,
            depth: 3,
            objects: Vec::new(),
        }
    }

    /// Appends an object with its bounding box in output coordinates.
    ///
    /// # Arguments
    ///
    /// * `name` - Class name of the object.
    /// * `bndbox` - `(xmin, ymin, xmax, ymax)` in output pixels.
    pub fn add_object(&mut self, name: &str, bndbox: (u32, u32, u32, u32)) {
        let (xmin, ymin, xmax, ymax) = bndbox;
        self.objects.push(AnnotatedObject {
            name: name.to_string(),
            xmin,
            ymin,
            xmax,
            ymax,
        });
    }

    /// Renders the record as Pascal VOC XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();

        let _ = writeln!(xml, r#"<annotation verified="yes">"#);
        let _ = writeln!(xml, "  <folder>images</folder>");
        let _ = writeln!(
            xml,
            "  <filename>{}</filename>",
            escape_xml(&self.filename)
        );
        let _ = writeln!(
            xml,
            "  <path>../images/{}</path>",
            escape_xml(&self.filename)
        );
        let _ = writeln!(xml, "  <source>");
        let _ = writeln!(
            xml,
            "    <database>Generated for UISketch synthetic dataset</database>"
        );
        let _ = writeln!(xml, "  </source>");
        let _ = writeln!(xml, "  <size>");
        let _ = writeln!(xml, "    <width>{}</width>", self.width);
        let _ = writeln!(xml, "    <height>{}</height>", self.height);
        let _ = writeln!(xml, "    <depth>{}</depth>", self.depth);
        let _ = writeln!(xml, "  </size>");
        let _ = writeln!(xml, "  <segmented>0</segmented>");

        for object in &self.objects {
            let _ = writeln!(xml, "  <object>");
            let _ = writeln!(xml, "    <name>{}</name>", escape_xml(&object.name));
            let _ = writeln!(xml, "    <pose>Unspecified</pose>");
            let _ = writeln!(xml, "    <truncated>0</truncated>");
            let _ = writeln!(xml, "    <difficult>0</difficult>");
            let _ = writeln!(xml, "    <bndbox>");
            let _ = writeln!(xml, "      <xmin>{}</xmin>", object.xmin);
            let _ = writeln!(xml, "      <ymin>{}</ymin>", object.ymin);
            let _ = writeln!(xml, "      <xmax>{}</xmax>", object.xmax);
            let _ = writeln!(xml, "      <ymax>{}</ymax>", object.ymax);
            let _ = writeln!(xml, "    </bndbox>");
            let _ = writeln!(xml, "  </object>");
        }

        let _ = write!(xml, "</annotation>");
        xml
    }

    /// Writes the rendered XML to a file.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationStage::Annotation`] processing error if the
    /// file cannot be written.
    pub fn write_to(&self, path: &Path) -> DatagenResult<()> {
        std::fs::write(path, self.to_xml()).map_err(|error| {
            DatagenError::processing(
                GenerationStage::Annotation,
                path.display().to_string(),
                error,
            )
        })
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_carries_square_size() {
        let record = AnnotationRecord::new("UISketch-000000000", 640);
        assert_eq!(record.filename, "UISketch-000000000.jpg");
        assert_eq!(record.width, 640);
        assert_eq!(record.height, 640);
        assert_eq!(record.depth, 3);
        assert!(record.objects.is_empty());
    }

    #[test]
    fn test_objects_keep_insertion_order() {
        let mut record = AnnotationRecord::new("UISketch-000000001", 600);
        record.add_object("button", (1, 2, 30, 40));
        record.add_object("slider", (50, 60, 70, 80));

        assert_eq!(record.objects[0].name, "button");
        assert_eq!(record.objects[1].name, "slider");
        assert_eq!(record.objects[1].xmin, 50);
        assert_eq!(record.objects[1].ymax, 80);
    }

    #[test]
    fn test_xml_layout() {
        let mut record = AnnotationRecord::new("UISketch-000000002", 600);
        record.add_object("text_field", (10, 20, 110, 60));
        let xml = record.to_xml();

        assert!(xml.starts_with(r#"<annotation verified="yes">"#));
        assert!(xml.ends_with("</annotation>"));
        assert!(xml.contains("<filename>UISketch-000000002.jpg</filename>"));
        assert!(xml.contains("<path>../images/UISketch-000000002.jpg</path>"));
        assert!(xml.contains("<width>600</width>"));
        assert!(xml.contains("<name>text_field</name>"));
        assert!(xml.contains("<xmin>10</xmin>"));
        assert!(xml.contains("<ymax>60</ymax>"));
        assert!(xml.contains("<segmented>0</segmented>"));
        assert_eq!(xml.matches("<object>").count(), 1);
    }

    #[test]
    fn test_xml_escapes_special_characters() {
        let mut record = AnnotationRecord::new("UISketch-000000003", 600);
        record.add_object("a<b&\"c\"", (0, 0, 1, 1));
        let xml = record.to_xml();
        assert!(xml.contains("<name>a&lt;b&amp;&quot;c&quot;</name>"));
    }
}
