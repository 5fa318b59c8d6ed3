//! Label-file persistence in the YOLO text format.
//!
//! One `.txt` per image sharing the image's base filename. Each line:
//!
//! ```text
//! <class_id> <x_center> <y_center> <width> <height>
//! ```
//!
//! All coordinates are normalized to `[0, 1]` relative to image size.
//! An image with no annotations has no label file at all; an empty file
//! is never written.
//!
//! Parsing and formatting are pure string functions so they can be
//! tested without a filesystem; [`LabelStore`] adds the file I/O.

use std::fs;
use std::path::PathBuf;

use crate::error::LabelError;
use crate::model::{Annotation, AnnotationSet, ClassTable};

/// Extension used for label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Parse label-file content into an annotation set.
///
/// Lines that fail to parse or violate the range/class invariants are
/// skipped with a warning and parsing continues; a corrupt line never
/// aborts the load. Stable ids are assigned densely over the lines that
/// survive, so the loaded ids are exactly `0..n-1`.
pub fn parse_labels(content: &str, classes: &ClassTable) -> AnnotationSet {
    let mut set = AnnotationSet::new();
    for (line_idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line, classes) {
            Ok((class_id, geometry)) => {
                if let Some(name) = classes.name(class_id) {
                    set.push(class_id, name, geometry);
                }
            }
            Err(reason) => {
                log::warn!("skipping label line {}: {}", line_idx + 1, reason);
            }
        }
    }
    set
}

fn parse_line(line: &str, classes: &ClassTable) -> Result<(usize, (f32, f32, f32, f32)), String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 {
        return Err(format!("expected 5 fields, found {}", parts.len()));
    }

    let class_id: usize = parts[0]
        .parse()
        .map_err(|_| format!("invalid class id '{}'", parts[0]))?;

    let mut coords = [0.0f32; 4];
    for (slot, raw) in coords.iter_mut().zip(&parts[1..]) {
        *slot = raw
            .parse()
            .map_err(|_| format!("invalid coordinate '{raw}'"))?;
    }
    let [x_center, y_center, width, height] = coords;

    if coords.iter().any(|v| !(0.0..=1.0).contains(v)) {
        return Err("coordinates outside [0, 1]".to_string());
    }
    if !classes.contains(class_id) {
        return Err(format!(
            "class id {} out of range (0-{})",
            class_id,
            classes.len() - 1
        ));
    }

    Ok((class_id, (x_center, y_center, width, height)))
}

/// Format an annotation set as label-file content: one line per
/// annotation, fields space-joined, geometry at 6 decimal places, no
/// trailing blank line beyond the final newline.
pub fn format_labels(set: &AnnotationSet) -> String {
    let mut out = String::new();
    for ann in set.iter() {
        out.push_str(&format!(
            "{} {:.6} {:.6} {:.6} {:.6}\n",
            ann.class_id, ann.x_center, ann.y_center, ann.width, ann.height
        ));
    }
    out
}

/// Structural and range check of one annotation.
///
/// Defensive only: [`LabelStore::save`] trusts its callers and does not
/// re-validate.
pub fn validate(ann: &Annotation, classes: &ClassTable) -> bool {
    (0.0..=1.0).contains(&ann.x_center)
        && (0.0..=1.0).contains(&ann.y_center)
        && (0.0..=1.0).contains(&ann.width)
        && (0.0..=1.0).contains(&ann.height)
        && ann.width > 0.0
        && ann.height > 0.0
        && classes.contains(ann.class_id)
}

/// Reads and writes per-image label files under one directory.
#[derive(Debug, Clone)]
pub struct LabelStore {
    labels_dir: PathBuf,
}

impl LabelStore {
    /// A store rooted at the given labels directory.
    pub fn new(labels_dir: impl Into<PathBuf>) -> Self {
        Self {
            labels_dir: labels_dir.into(),
        }
    }

    /// Label path for an image: the image's base name with the label
    /// extension, under the labels directory.
    pub fn label_path(&self, image_name: &str) -> PathBuf {
        let base = image_name
            .rsplit_once('.')
            .map(|(base, _)| base)
            .unwrap_or(image_name);
        self.labels_dir.join(format!("{base}.{LABEL_EXTENSION}"))
    }

    /// Load the annotations for an image.
    ///
    /// A missing label file means zero annotations, not an error.
    pub fn load(&self, image_name: &str, classes: &ClassTable) -> Result<AnnotationSet, LabelError> {
        let path = self.label_path(image_name);
        if !path.exists() {
            return Ok(AnnotationSet::new());
        }
        let content =
            fs::read_to_string(&path).map_err(|source| LabelError::Read { path, source })?;
        Ok(parse_labels(&content, classes))
    }

    /// Persist the annotations for an image.
    ///
    /// An empty set deletes the label file if present; everything else
    /// is a total overwrite (concurrent external edits are clobbered).
    pub fn save(&self, image_name: &str, set: &AnnotationSet) -> Result<(), LabelError> {
        let path = self.label_path(image_name);
        if set.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(|source| LabelError::Remove { path, source })?;
            }
            return Ok(());
        }
        fs::write(&path, format_labels(set)).map_err(|source| LabelError::Write { path, source })
    }
}
