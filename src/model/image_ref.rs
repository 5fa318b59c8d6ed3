//! Image references with lazily probed dimensions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// A dataset image: filename plus lazily resolved pixel dimensions.
///
/// The image's pixel grid is the authoritative coordinate space for all
/// pixel-space geometry, so dimensions must be resolved before any
/// conversion. They are read from the file header on first use and
/// cached; adapters that already know the size (e.g. from the browser)
/// can supply it up front with [`ImageRef::with_dimensions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    file_name: String,
    dimensions: Option<(u32, u32)>,
}

impl ImageRef {
    /// Reference an image whose dimensions are not yet known.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            dimensions: None,
        }
    }

    /// Reference an image with known dimensions (no probe needed).
    pub fn with_dimensions(file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            file_name: file_name.into(),
            dimensions: Some((width, height)),
        }
    }

    /// The image filename (with extension).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The filename without its extension; label files share this base.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(base, _)| base)
            .unwrap_or(&self.file_name)
    }

    /// Dimensions if already resolved.
    pub fn cached_dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Resolve `(width, height)`, probing the file header under
    /// `images_dir` on the first call.
    pub fn dimensions(&mut self, images_dir: &Path) -> Result<(u32, u32), DatasetError> {
        if let Some(dims) = self.dimensions {
            return Ok(dims);
        }
        let path = images_dir.join(&self.file_name);
        let dims = image::image_dimensions(&path)
            .map_err(|source| DatasetError::ImageProbe { path, source })?;
        self.dimensions = Some(dims);
        Ok(dims)
    }
}
