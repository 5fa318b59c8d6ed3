//! Dataset layout discovery and image listing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DatasetError;

/// Image extensions recognized when listing a dataset.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Where a dataset keeps its images and label files.
///
/// The conventional layout is `root/images` + `root/labels`; flat
/// datasets keep images and labels side by side in the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl DatasetPaths {
    /// Use `root/images` + `root/labels` when both exist, otherwise
    /// treat `root` as a flat directory holding both.
    pub fn discover(root: &Path) -> Self {
        let images_dir = root.join("images");
        let labels_dir = root.join("labels");
        if images_dir.is_dir() && labels_dir.is_dir() {
            Self {
                images_dir,
                labels_dir,
            }
        } else {
            Self {
                images_dir: root.to_path_buf(),
                labels_dir: root.to_path_buf(),
            }
        }
    }

    /// Sorted image filenames in the images directory.
    pub fn list_images(&self) -> Result<Vec<String>, DatasetError> {
        let entries = fs::read_dir(&self.images_dir).map_err(|source| DatasetError::ListDir {
            path: self.images_dir.clone(),
            source,
        })?;

        let mut images = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DatasetError::ListDir {
                path: self.images_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if !is_image {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                images.push(name.to_string());
            }
        }
        images.sort();
        Ok(images)
    }
}
