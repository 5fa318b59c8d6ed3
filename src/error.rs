//! Error types for dataset and label-file I/O.

use std::path::PathBuf;

/// Errors from reading or writing per-image label files.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// Reading an existing label file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a label file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Removing a label file (for an emptied annotation set) failed.
    #[error("failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from inspecting the dataset on disk.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The image header could not be read to determine dimensions.
    #[error("failed to read image dimensions from {}: {source}", .path.display())]
    ImageProbe {
        path: PathBuf,
        source: image::ImageError,
    },

    /// A dataset directory could not be listed.
    #[error("failed to list {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },
}
