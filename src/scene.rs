//! Declarative rendering of annotations over an image.
//!
//! Produces a scene description — boxes and labels in image pixel space
//! — for the hosting UI layer to draw. Pure data, no side effects; the
//! selected annotation is highlighted so the UI needs no styling logic
//! of its own.

use serde::Serialize;

use crate::coords;
use crate::model::{Annotation, AnnotationId, AnnotationSet, ClassTable};

/// Line width for unselected boxes.
const BOX_LINE_WIDTH: f32 = 3.0;
/// Line width for the selected box.
const SELECTED_LINE_WIDTH: f32 = 5.0;
/// Highlight color for the selected box.
const SELECTED_COLOR: &str = "#ffff00";
/// Extra fill opacity applied to the selected box, capped at 1.
const SELECTED_OPACITY_BOOST: f32 = 0.3;

/// Display options for scene generation.
#[derive(Debug, Clone, Serialize)]
pub struct SceneStyle {
    /// Box fill opacity in `[0, 1]`.
    pub opacity: f32,
    /// Include the positional index in each label.
    pub show_indices: bool,
    /// Include the normalized center coordinates in each label.
    pub show_coords: bool,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            opacity: 0.3,
            show_indices: true,
            show_coords: false,
        }
    }
}

/// One drawable box, in image pixel space.
#[derive(Debug, Clone, Serialize)]
pub struct SceneBox {
    /// Positional index (display order).
    pub index: usize,
    /// Stable annotation id.
    pub id: AnnotationId,
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
    /// Outline color, `#rrggbb`.
    pub line_color: String,
    pub line_width: f32,
    /// Fill color, `rgba(r,g,b,a)`.
    pub fill_color: String,
    pub selected: bool,
}

/// A text label anchored at the top-left corner of its box.
#[derive(Debug, Clone, Serialize)]
pub struct SceneLabel {
    pub x: f32,
    pub y: f32,
    pub text: String,
    /// Label background color, `#rrggbb`.
    pub color: String,
}

/// Everything the UI layer needs to draw one image's annotations.
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    /// Image filename.
    pub image: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    pub boxes: Vec<SceneBox>,
    pub labels: Vec<SceneLabel>,
}

impl Scene {
    /// Serialize for handing across the UI boundary.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Build the scene for one image's annotations.
pub fn render(
    image: &str,
    dimensions: (u32, u32),
    annotations: &AnnotationSet,
    classes: &ClassTable,
    selected: Option<AnnotationId>,
    style: &SceneStyle,
) -> Scene {
    let (width, height) = dimensions;
    let mut boxes = Vec::with_capacity(annotations.len());
    let mut labels = Vec::with_capacity(annotations.len());

    for (index, ann) in annotations.iter().enumerate() {
        let (x_min, y_min, x_max, y_max) = coords::yolo_to_pixel(ann, width, height);
        let class_color = classes.color(ann.class_id);
        let is_selected = selected == Some(ann.id);

        let (line_color, line_width, fill_color) = if is_selected {
            let opacity = (style.opacity + SELECTED_OPACITY_BOOST).min(1.0);
            (
                SELECTED_COLOR.to_string(),
                SELECTED_LINE_WIDTH,
                rgba(SELECTED_COLOR, opacity),
            )
        } else {
            (
                class_color.to_string(),
                BOX_LINE_WIDTH,
                rgba(class_color, style.opacity),
            )
        };

        boxes.push(SceneBox {
            index,
            id: ann.id,
            x_min,
            y_min,
            x_max,
            y_max,
            line_color,
            line_width,
            fill_color,
            selected: is_selected,
        });
        labels.push(SceneLabel {
            x: x_min,
            y: y_min,
            text: label_text(index, ann, style),
            color: class_color.to_string(),
        });
    }

    Scene {
        image: image.to_string(),
        width,
        height,
        boxes,
        labels,
    }
}

fn label_text(index: usize, ann: &Annotation, style: &SceneStyle) -> String {
    let mut parts = Vec::new();
    if style.show_indices {
        parts.push(format!("#{index}"));
    }
    parts.push(ann.class_name.clone());
    if style.show_coords {
        parts.push(format!("({:.3}, {:.3})", ann.x_center, ann.y_center));
    }
    parts.join(" | ")
}

/// Expand a `#rrggbb` color into an `rgba(r,g,b,a)` string.
fn rgba(hex: &str, opacity: f32) -> String {
    let (r, g, b) = hex_to_rgb(hex).unwrap_or((255, 255, 255));
    format!("rgba({r},{g},{b},{opacity})")
}

/// Parse a `#rrggbb` hex color into its components.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
