//! Conversion between YOLO normalized boxes and pixel-space rectangles.
//!
//! YOLO geometry is center-based and normalized to `[0, 1]` relative to
//! the image size; pixel-space rectangles are corner-based
//! `(x_min, y_min, x_max, y_max)`. Both directions clamp into their
//! target range, and degenerate pixel rectangles are expanded to a 1 px
//! minimum before normalizing so a stored box can never end up with
//! zero width or height.

use crate::model::Annotation;

/// Convert normalized geometry to pixel corners.
///
/// Each bound is clamped into `[0, dimension]` independently, so boxes
/// whose stored center/size would poke past the image edge come back
/// cropped to it.
pub fn yolo_to_pixel(ann: &Annotation, img_width: u32, img_height: u32) -> (f32, f32, f32, f32) {
    let w = img_width as f32;
    let h = img_height as f32;
    let x_center = ann.x_center * w;
    let y_center = ann.y_center * h;
    let width = ann.width * w;
    let height = ann.height * h;

    let x_min = (x_center - width / 2.0).max(0.0);
    let y_min = (y_center - height / 2.0).max(0.0);
    let x_max = (x_center + width / 2.0).min(w);
    let y_max = (y_center + height / 2.0).min(h);
    (x_min, y_min, x_max, y_max)
}

/// Convert pixel corners to normalized `(x_center, y_center, width, height)`.
///
/// The steps run in a fixed order: clamp the inputs into the image,
/// expand zero-or-negative extents to 1 px, normalize, clamp the four
/// outputs into `[0, 1]`. Fixing degeneracy before normalizing is what
/// keeps width and height strictly positive.
pub fn pixel_to_yolo(
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
    img_width: u32,
    img_height: u32,
) -> (f32, f32, f32, f32) {
    let w = img_width as f32;
    let h = img_height as f32;

    let x_min = x_min.clamp(0.0, w);
    let y_min = y_min.clamp(0.0, h);
    let mut x_max = x_max.clamp(0.0, w);
    let mut y_max = y_max.clamp(0.0, h);

    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }

    let x_center = ((x_min + x_max) / 2.0 / w).clamp(0.0, 1.0);
    let y_center = ((y_min + y_max) / 2.0 / h).clamp(0.0, 1.0);
    let width = ((x_max - x_min) / w).clamp(0.0, 1.0);
    let height = ((y_max - y_min) / h).clamp(0.0, 1.0);
    (x_center, y_center, width, height)
}

/// Minimum-size gate applied before committing a create or edit.
pub fn validate_pixel_coords(x_min: f32, y_min: f32, x_max: f32, y_max: f32, min_size: f32) -> bool {
    (x_max - x_min) >= min_size && (y_max - y_min) >= min_size
}
