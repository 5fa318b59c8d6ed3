//! Interaction reconciliation: turning canvas events into annotation
//! state transitions.
//!
//! The hosting UI layer translates user gestures into [`Event`] values
//! and feeds them to a [`ReviewSession`], which owns the authoritative
//! annotation list for the active image. Every mutating event follows
//! the same discipline: validate, snapshot for undo, mutate in memory,
//! persist, report an [`Outcome`]. Failed validation rejects the event
//! with no mutation and no write. A failed write never rolls back the
//! in-memory edit; the outcome carries the failure so the caller knows
//! the disk copy is stale.
//!
//! Canvas coordinates have y growing downward while the box geometry is
//! measured from the opposite edge, so every rectangle crossing the
//! boundary is flipped with `y_img = img_h - y_canvas`.

use std::path::Path;

use crate::config;
use crate::coords;
use crate::dataset::DatasetPaths;
use crate::error::{DatasetError, LabelError};
use crate::labels::LabelStore;
use crate::model::{Annotation, AnnotationId, AnnotationSet, ClassTable, ImageRef, DEFAULT_CLASS};
use crate::scene::{self, Scene, SceneStyle};
use crate::undo::UndoStack;

/// Minimum pixel size for a newly drawn box.
pub const MIN_CREATE_SIZE: f32 = 10.0;
/// Minimum pixel size for an edited box; smaller results keep the
/// original geometry.
pub const MIN_EDIT_SIZE: f32 = 5.0;
/// Per-field tolerance below which an edited box counts as unchanged.
pub const EDIT_EPSILON: f32 = 1e-5;
/// Margin added around a box when hit-testing clicks.
pub const CLICK_MARGIN: f32 = 10.0;

// ============================================================================
// Events
// ============================================================================

/// An axis-aligned rectangle in canvas coordinates (y grows downward).
///
/// Corners need not be ordered; consumers normalize with min/max.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Corner updates for one shape, as produced by dragging a single edge
/// or corner handle. `None` fields are taken from the shape's current
/// geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialCorners {
    pub x0: Option<f32>,
    pub y0: Option<f32>,
    pub x1: Option<f32>,
    pub y1: Option<f32>,
}

/// What a delete event addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    /// The most recently created annotation.
    Last,
    /// A specific annotation by stable id.
    Id(AnnotationId),
    /// The current selection.
    Selected,
}

/// One user interaction, as translated by the UI adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new rectangle was drawn; `class` is the class-selector value.
    Create { rect: CanvasRect, class: i64 },
    /// The full canvas shape list after a move/resize pass.
    Edit(Vec<CanvasRect>),
    /// A single shape's corner(s) moved; the rest are unchanged.
    ResizeMove {
        index: usize,
        corners: PartialCorners,
    },
    /// A plain click at a canvas point.
    Click { x: f32, y: f32 },
    /// Explicit selection (e.g. from the annotation list panel).
    Select { id: AnnotationId },
    /// Remove an annotation.
    Delete(DeleteTarget),
    /// Reassign the selected annotation's class.
    SetClass { class: i64 },
    /// Restore the previous snapshot for the active image.
    Undo,
}

impl Event {
    /// Classify a raw canvas shape list against the current annotation
    /// count, for adapters that cannot tell a draw from a drag: more
    /// shapes than annotations means the last one was just drawn, an
    /// equal (non-zero) count means a move/resize pass, anything else
    /// is not an event.
    pub fn from_shape_sync(
        shapes: Vec<CanvasRect>,
        annotation_count: usize,
        class: i64,
    ) -> Option<Event> {
        if shapes.len() > annotation_count {
            shapes.last().copied().map(|rect| Event::Create { rect, class })
        } else if !shapes.is_empty() && shapes.len() == annotation_count {
            Some(Event::Edit(shapes))
        } else {
            None
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Whether a mutation reached the label file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// The label file reflects the in-memory state.
    Saved,
    /// The write failed; the in-memory edit stands and the disk copy is
    /// stale.
    Failed(String),
}

impl WriteStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, WriteStatus::Saved)
    }
}

/// Why an event was rejected. No state was mutated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("box too small ({width:.0}x{height:.0} px, minimum {min:.0}x{min:.0} px)")]
    BoxTooSmall { width: f32, height: f32, min: f32 },
    #[error("no annotation with id {0}")]
    UnknownId(AnnotationId),
    #[error("no annotations to delete")]
    NothingToDelete,
    #[error("no annotation selected")]
    NoSelection,
    #[error("class {class} out of range (0-{max})")]
    ClassOutOfRange { class: i64, max: usize },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to undo for this image")]
    UndoOtherImage,
    #[error("{shapes} shapes do not match {annotations} annotations")]
    ShapeCountMismatch { shapes: usize, annotations: usize },
    #[error("shape index {0} out of range")]
    ShapeIndexOutOfRange(usize),
    #[error("image dimensions unavailable: {0}")]
    DimensionsUnavailable(String),
}

/// The result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created {
        id: AnnotationId,
        write: WriteStatus,
    },
    Edited {
        /// Number of annotations whose geometry moved beyond tolerance.
        changed: usize,
        write: WriteStatus,
    },
    Selected {
        id: AnnotationId,
    },
    Deleted {
        id: AnnotationId,
        write: WriteStatus,
    },
    ClassChanged {
        id: AnnotationId,
        write: WriteStatus,
    },
    Undone {
        /// Snapshots still available after this undo.
        remaining: usize,
        write: WriteStatus,
    },
    /// The event was invalid; nothing changed and nothing was written.
    Rejected(RejectReason),
    /// The event was valid but required no state change.
    NoOp,
}

// ============================================================================
// Session
// ============================================================================

/// Owns the review state for one editing context: the active image, its
/// authoritative annotation list, the undo stack, the selection, and
/// the persistence handles.
///
/// One session per editing context (browser tab, test, batch check);
/// there is no process-global state.
#[derive(Debug)]
pub struct ReviewSession {
    paths: DatasetPaths,
    store: LabelStore,
    classes: ClassTable,
    undo: UndoStack,
    image: ImageRef,
    annotations: AnnotationSet,
    selected: Option<AnnotationId>,
}

impl ReviewSession {
    /// Open a session on a dataset root: discover the directory layout,
    /// load `classes.yaml` from the root (falling back to the default
    /// table), and activate `image_name`.
    pub fn open(root: &Path, image_name: &str) -> Result<Self, LabelError> {
        let paths = DatasetPaths::discover(root);
        let classes = config::load_class_table(&root.join("classes.yaml"));
        Self::with_parts(paths, classes, ImageRef::new(image_name))
    }

    /// Build a session from explicit parts, for adapters that already
    /// loaded the configuration or know the image dimensions.
    pub fn with_parts(
        paths: DatasetPaths,
        classes: ClassTable,
        image: ImageRef,
    ) -> Result<Self, LabelError> {
        let store = LabelStore::new(paths.labels_dir.clone());
        let annotations = store.load(image.file_name(), &classes)?;
        Ok(Self {
            paths,
            store,
            classes,
            undo: UndoStack::default(),
            image,
            annotations,
            selected: None,
        })
    }

    /// The active image's annotations, in display order.
    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    /// The class table in effect for this session.
    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// The stable id of the selected annotation, if any.
    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    /// The active image's filename.
    pub fn image_name(&self) -> &str {
        self.image.file_name()
    }

    /// Snapshots currently available on the undo stack (across images).
    pub fn undo_count(&self) -> usize {
        self.undo.undo_count()
    }

    /// Switch the active image, superseding the current annotation list.
    ///
    /// Undo snapshots for the previous image stay on the stack but can
    /// only be consumed once that image is active again.
    pub fn open_image(&mut self, image_name: &str) -> Result<(), LabelError> {
        self.annotations = self.store.load(image_name, &self.classes)?;
        self.image = ImageRef::new(image_name);
        self.selected = None;
        Ok(())
    }

    /// Like [`ReviewSession::open_image`] with dimensions already known,
    /// skipping the header probe.
    pub fn open_image_with_dimensions(
        &mut self,
        image_name: &str,
        width: u32,
        height: u32,
    ) -> Result<(), LabelError> {
        self.open_image(image_name)?;
        self.image = ImageRef::with_dimensions(image_name, width, height);
        Ok(())
    }

    /// Apply one interaction event.
    ///
    /// Never panics and never propagates an error: failures surface as
    /// [`Outcome::Rejected`] or a failed [`WriteStatus`]. Selection
    /// side effects (a drag selecting the dragged shape) are visible
    /// through [`ReviewSession::selected`].
    pub fn apply(&mut self, event: Event) -> Outcome {
        match event {
            Event::Create { rect, class } => self.handle_create(rect, class),
            Event::Edit(shapes) => self.handle_edit(shapes),
            Event::ResizeMove { index, corners } => self.handle_resize_move(index, corners),
            Event::Click { x, y } => self.handle_click(x, y),
            Event::Select { id } => self.handle_select(id),
            Event::Delete(target) => self.handle_delete(target),
            Event::SetClass { class } => self.handle_set_class(class),
            Event::Undo => self.handle_undo(),
        }
    }

    /// Render the current state as a scene for the UI layer.
    pub fn render(&mut self, style: &SceneStyle) -> Result<Scene, DatasetError> {
        let dims = self.image.dimensions(&self.paths.images_dir)?;
        Ok(scene::render(
            self.image.file_name(),
            dims,
            &self.annotations,
            &self.classes,
            self.selected,
            style,
        ))
    }

    fn dimensions(&mut self) -> Result<(u32, u32), RejectReason> {
        self.image.dimensions(&self.paths.images_dir).map_err(|e| {
            log::error!("{e}");
            RejectReason::DimensionsUnavailable(e.to_string())
        })
    }

    fn persist(&mut self) -> WriteStatus {
        match self.store.save(self.image.file_name(), &self.annotations) {
            Ok(()) => WriteStatus::Saved,
            Err(e) => {
                log::error!("save failed, in-memory state kept: {e}");
                WriteStatus::Failed(e.to_string())
            }
        }
    }

    fn handle_create(&mut self, rect: CanvasRect, class: i64) -> Outcome {
        let (img_w, img_h) = match self.dimensions() {
            Ok(dims) => dims,
            Err(reason) => return Outcome::Rejected(reason),
        };

        let (x_min, y_min, x_max, y_max) = canvas_to_image(rect, img_h);
        if !coords::validate_pixel_coords(x_min, y_min, x_max, y_max, MIN_CREATE_SIZE) {
            return Outcome::Rejected(RejectReason::BoxTooSmall {
                width: x_max - x_min,
                height: y_max - y_min,
                min: MIN_CREATE_SIZE,
            });
        }

        // A stale class selector must not lose the drawn box: fall back
        // to class 0 instead of rejecting.
        let class_id = if class >= 0 && self.classes.contains(class as usize) {
            class as usize
        } else {
            log::warn!("class selector value {class} out of range, using class 0");
            0
        };

        self.undo.push_state(self.image.file_name(), &self.annotations);

        let geometry = coords::pixel_to_yolo(x_min, y_min, x_max, y_max, img_w, img_h);
        let class_name = self
            .classes
            .name(class_id)
            .unwrap_or(DEFAULT_CLASS)
            .to_string();
        let id = self.annotations.push(class_id, &class_name, geometry);
        log::info!("created annotation {id} ({class_name}) on {}", self.image.file_name());

        let write = self.persist();
        Outcome::Created { id, write }
    }

    fn handle_edit(&mut self, shapes: Vec<CanvasRect>) -> Outcome {
        if shapes.len() != self.annotations.len() {
            return Outcome::Rejected(RejectReason::ShapeCountMismatch {
                shapes: shapes.len(),
                annotations: self.annotations.len(),
            });
        }
        if shapes.is_empty() {
            return Outcome::NoOp;
        }
        let (img_w, img_h) = match self.dimensions() {
            Ok(dims) => dims,
            Err(reason) => return Outcome::Rejected(reason),
        };

        // Snapshot before computing deltas; a drag that moves nothing
        // still costs one undo slot.
        self.undo.push_state(self.image.file_name(), &self.annotations);

        let mut updates: Vec<Option<(f32, f32, f32, f32)>> = Vec::with_capacity(shapes.len());
        let mut changed = 0usize;
        for (index, rect) in shapes.iter().enumerate() {
            let (x_min, y_min, x_max, y_max) = canvas_to_image(*rect, img_h);
            if !coords::validate_pixel_coords(x_min, y_min, x_max, y_max, MIN_EDIT_SIZE) {
                log::debug!("edit of shape {index} below minimum size, keeping original");
                updates.push(None);
                continue;
            }
            let geometry = coords::pixel_to_yolo(x_min, y_min, x_max, y_max, img_w, img_h);
            let (x_center, y_center, width, height) = geometry;
            let Some(ann) = self.annotations.get(index) else {
                updates.push(None);
                continue;
            };
            if (ann.x_center - x_center).abs() > EDIT_EPSILON
                || (ann.y_center - y_center).abs() > EDIT_EPSILON
                || (ann.width - width).abs() > EDIT_EPSILON
                || (ann.height - height).abs() > EDIT_EPSILON
            {
                changed += 1;
            }
            updates.push(Some(geometry));
        }

        if changed == 0 {
            return Outcome::NoOp;
        }

        for (index, geometry) in updates.into_iter().enumerate() {
            let Some((x_center, y_center, width, height)) = geometry else {
                continue;
            };
            if let Some(ann) = self.annotations.get_mut(index) {
                ann.x_center = x_center;
                ann.y_center = y_center;
                ann.width = width;
                ann.height = height;
            }
        }

        let write = self.persist();
        Outcome::Edited { changed, write }
    }

    fn handle_resize_move(&mut self, index: usize, corners: PartialCorners) -> Outcome {
        if index >= self.annotations.len() {
            return Outcome::Rejected(RejectReason::ShapeIndexOutOfRange(index));
        }
        let (img_w, img_h) = match self.dimensions() {
            Ok(dims) => dims,
            Err(reason) => return Outcome::Rejected(reason),
        };

        // Rebuild the full shape list from current geometry and overlay
        // the moved corner(s) on the affected shape.
        let mut shapes: Vec<CanvasRect> = self
            .annotations
            .iter()
            .map(|ann| annotation_to_canvas(ann, img_w, img_h))
            .collect();
        let shape = &mut shapes[index];
        if let Some(x0) = corners.x0 {
            shape.x0 = x0;
        }
        if let Some(y0) = corners.y0 {
            shape.y0 = y0;
        }
        if let Some(x1) = corners.x1 {
            shape.x1 = x1;
        }
        if let Some(y1) = corners.y1 {
            shape.y1 = y1;
        }

        // Dragging a handle also selects the shape it belongs to.
        if let Some(ann) = self.annotations.get(index) {
            self.selected = Some(ann.id);
        }

        self.handle_edit(shapes)
    }

    fn handle_click(&mut self, x: f32, y: f32) -> Outcome {
        let (img_w, img_h) = match self.dimensions() {
            Ok(dims) => dims,
            Err(reason) => return Outcome::Rejected(reason),
        };

        // Reverse creation order: the most recently created annotation
        // wins where boxes overlap.
        for index in (0..self.annotations.len()).rev() {
            let Some(ann) = self.annotations.get(index) else {
                continue;
            };
            let rect = annotation_to_canvas(ann, img_w, img_h);
            if x >= rect.x0 - CLICK_MARGIN
                && x <= rect.x1 + CLICK_MARGIN
                && y >= rect.y0 - CLICK_MARGIN
                && y <= rect.y1 + CLICK_MARGIN
            {
                self.selected = Some(ann.id);
                return Outcome::Selected { id: ann.id };
            }
        }

        // No hit keeps the previous selection.
        Outcome::NoOp
    }

    fn handle_select(&mut self, id: AnnotationId) -> Outcome {
        if self.annotations.by_id(id).is_none() {
            return Outcome::Rejected(RejectReason::UnknownId(id));
        }
        self.selected = Some(id);
        Outcome::Selected { id }
    }

    fn handle_delete(&mut self, target: DeleteTarget) -> Outcome {
        if self.annotations.is_empty() {
            return Outcome::Rejected(RejectReason::NothingToDelete);
        }
        let id = match target {
            DeleteTarget::Last => match self.annotations.last() {
                Some(ann) => ann.id,
                None => return Outcome::Rejected(RejectReason::NothingToDelete),
            },
            DeleteTarget::Id(id) => {
                if self.annotations.by_id(id).is_none() {
                    return Outcome::Rejected(RejectReason::UnknownId(id));
                }
                id
            }
            DeleteTarget::Selected => match self.selected {
                Some(id) if self.annotations.by_id(id).is_some() => id,
                Some(id) => return Outcome::Rejected(RejectReason::UnknownId(id)),
                None => return Outcome::Rejected(RejectReason::NoSelection),
            },
        };

        self.undo.push_state(self.image.file_name(), &self.annotations);
        self.annotations.remove(id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        log::info!("deleted annotation {id} on {}", self.image.file_name());

        let write = self.persist();
        Outcome::Deleted { id, write }
    }

    fn handle_set_class(&mut self, class: i64) -> Outcome {
        let Some(id) = self.selected else {
            return Outcome::Rejected(RejectReason::NoSelection);
        };
        if self.annotations.by_id(id).is_none() {
            return Outcome::Rejected(RejectReason::UnknownId(id));
        }
        // Unlike create, an explicit reassignment to a nonexistent
        // class is rejected rather than coerced.
        if class < 0 || !self.classes.contains(class as usize) {
            return Outcome::Rejected(RejectReason::ClassOutOfRange {
                class,
                max: self.classes.len() - 1,
            });
        }

        self.undo.push_state(self.image.file_name(), &self.annotations);
        if let Some(ann) = self.annotations.by_id_mut(id) {
            ann.set_class(class as usize, &self.classes);
        }

        let write = self.persist();
        Outcome::ClassChanged { id, write }
    }

    fn handle_undo(&mut self) -> Outcome {
        let Some(snapshot) = self.undo.pop_state() else {
            return Outcome::Rejected(RejectReason::NothingToUndo);
        };
        if snapshot.image_key != self.image.file_name() {
            // Preserve the snapshot for when its image is active again.
            self.undo.push_back(snapshot);
            return Outcome::Rejected(RejectReason::UndoOtherImage);
        }

        self.annotations = snapshot.annotations;
        if let Some(id) = self.selected {
            if self.annotations.by_id(id).is_none() {
                self.selected = None;
            }
        }

        let write = self.persist();
        Outcome::Undone {
            remaining: self.undo.undo_count(),
            write,
        }
    }
}

/// Normalize a canvas rectangle's corners and flip it into image space.
fn canvas_to_image(rect: CanvasRect, img_h: u32) -> (f32, f32, f32, f32) {
    let x_min = rect.x0.min(rect.x1);
    let x_max = rect.x0.max(rect.x1);
    let y_min_canvas = rect.y0.min(rect.y1);
    let y_max_canvas = rect.y0.max(rect.y1);
    let h = img_h as f32;
    (x_min, h - y_max_canvas, x_max, h - y_min_canvas)
}

/// Rebuild the canvas rectangle for an annotation: the inverse of the
/// create/edit flip, used for partial-corner overlays and hit testing.
fn annotation_to_canvas(ann: &Annotation, img_w: u32, img_h: u32) -> CanvasRect {
    let w = img_w as f32;
    let h = img_h as f32;
    let x_center = ann.x_center * w;
    let y_center = ann.y_center * h;
    let width = ann.width * w;
    let height = ann.height * h;
    CanvasRect {
        x0: x_center - width / 2.0,
        y0: h - (y_center + height / 2.0),
        x1: x_center + width / 2.0,
        y1: h - (y_center - height / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> CanvasRect {
        CanvasRect { x0, y0, x1, y1 }
    }

    fn classes() -> ClassTable {
        ClassTable::new(vec!["car".to_string(), "truck".to_string()], Vec::new())
    }

    /// Session over a flat temp dataset with an 800x600 active image.
    fn session_in(dir: &Path) -> ReviewSession {
        let paths = DatasetPaths {
            images_dir: dir.to_path_buf(),
            labels_dir: dir.to_path_buf(),
        };
        ReviewSession::with_parts(
            paths,
            classes(),
            ImageRef::with_dimensions("frame_0001.jpg", 800, 600),
        )
        .unwrap()
    }

    fn label_path(dir: &Path) -> PathBuf {
        dir.join("frame_0001.txt")
    }

    #[test]
    fn test_create_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        let outcome = session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        let Outcome::Created { id, write } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(id, 0);
        assert!(write.is_saved());

        let ann = session.annotations().get(0).unwrap();
        assert_eq!(ann.class_id, 0);
        assert_eq!(ann.class_name, "car");

        // The stored geometry reconstructs the y-flipped pixel box.
        let (x_min, y_min, x_max, y_max) = coords::yolo_to_pixel(ann, 800, 600);
        assert!((x_min - 100.0).abs() < 1.0);
        assert!((y_min - 380.0).abs() < 1.0);
        assert!((x_max - 300.0).abs() < 1.0);
        assert!((y_max - 500.0).abs() < 1.0);

        // The label file gained exactly one line.
        let content = fs::read_to_string(label_path(dir.path())).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_create_rejects_tiny_box() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        let outcome = session.apply(Event::Create {
            rect: rect(10.0, 10.0, 12.0, 11.0),
            class: 0,
        });
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::BoxTooSmall { .. })
        ));
        assert!(session.annotations().is_empty());
        assert!(!label_path(dir.path()).exists());
        assert_eq!(session.undo_count(), 0);
    }

    #[test]
    fn test_create_coerces_out_of_range_class_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 17,
        });
        let ann = session.annotations().get(0).unwrap();
        assert_eq!(ann.class_id, 0);
        assert_eq!(ann.class_name, "car");
    }

    #[test]
    fn test_shape_sync_classification() {
        let shapes = vec![rect(0.0, 0.0, 50.0, 50.0), rect(60.0, 60.0, 120.0, 120.0)];

        // More shapes than annotations: the last one was drawn.
        let event = Event::from_shape_sync(shapes.clone(), 1, 0).unwrap();
        assert!(matches!(event, Event::Create { rect: r, .. } if r == shapes[1]));

        // Equal count: a move/resize pass.
        let event = Event::from_shape_sync(shapes.clone(), 2, 0).unwrap();
        assert!(matches!(event, Event::Edit(ref s) if s.len() == 2));

        // Fewer shapes than annotations, or none at all: no event.
        assert!(Event::from_shape_sync(shapes, 3, 0).is_none());
        assert!(Event::from_shape_sync(Vec::new(), 0, 0).is_none());
    }

    #[test]
    fn test_edit_moves_a_box() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });

        let outcome = session.apply(Event::Edit(vec![rect(150.0, 100.0, 350.0, 220.0)]));
        let Outcome::Edited { changed, write } = outcome else {
            panic!("expected Edited, got {outcome:?}");
        };
        assert_eq!(changed, 1);
        assert!(write.is_saved());

        let ann = session.annotations().get(0).unwrap();
        let (x_min, _, x_max, _) = coords::yolo_to_pixel(ann, 800, 600);
        assert!((x_min - 150.0).abs() < 1.0);
        assert!((x_max - 350.0).abs() < 1.0);
    }

    #[test]
    fn test_edit_without_movement_is_a_no_op_but_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        let before = fs::read_to_string(label_path(dir.path())).unwrap();
        let undo_before = session.undo_count();

        // Hand back exactly the shapes the annotations describe.
        let ann = session.annotations().get(0).unwrap().clone();
        let shape = annotation_to_canvas(&ann, 800, 600);
        let outcome = session.apply(Event::Edit(vec![shape]));

        assert_eq!(outcome, Outcome::NoOp);
        // The snapshot was still taken before the deltas were known.
        assert_eq!(session.undo_count(), undo_before + 1);
        assert_eq!(fs::read_to_string(label_path(dir.path())).unwrap(), before);
    }

    #[test]
    fn test_edit_below_minimum_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        let before = session.annotations().get(0).unwrap().clone();

        // A 2x2 px result fails the edit gate; the annotation stays.
        let outcome = session.apply(Event::Edit(vec![rect(100.0, 100.0, 102.0, 102.0)]));
        assert_eq!(outcome, Outcome::NoOp);
        assert_eq!(session.annotations().get(0).unwrap(), &before);
    }

    #[test]
    fn test_edit_shape_count_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });

        let outcome = session.apply(Event::Edit(vec![
            rect(0.0, 0.0, 50.0, 50.0),
            rect(60.0, 60.0, 120.0, 120.0),
        ]));
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::ShapeCountMismatch { shapes: 2, annotations: 1 })
        ));
    }

    #[test]
    fn test_resize_move_overlays_partial_corners() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Create {
            rect: rect(400.0, 300.0, 500.0, 400.0),
            class: 1,
        });

        // Drag only the right edge of the first box.
        let outcome = session.apply(Event::ResizeMove {
            index: 0,
            corners: PartialCorners {
                x1: Some(350.0),
                ..PartialCorners::default()
            },
        });
        let Outcome::Edited { changed, .. } = outcome else {
            panic!("expected Edited, got {outcome:?}");
        };
        assert_eq!(changed, 1);

        let first = session.annotations().get(0).unwrap();
        let (x_min, _, x_max, _) = coords::yolo_to_pixel(first, 800, 600);
        assert!((x_min - 100.0).abs() < 1.0);
        assert!((x_max - 350.0).abs() < 1.0);

        // The untouched box is untouched, and the dragged one is selected.
        let second = session.annotations().get(1).unwrap();
        let (sx_min, _, sx_max, _) = coords::yolo_to_pixel(second, 800, 600);
        assert!((sx_min - 400.0).abs() < 1.0);
        assert!((sx_max - 500.0).abs() < 1.0);
        assert_eq!(session.selected(), Some(first.id));
    }

    #[test]
    fn test_resize_move_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let outcome = session.apply(Event::ResizeMove {
            index: 3,
            corners: PartialCorners::default(),
        });
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::ShapeIndexOutOfRange(3))
        ));
    }

    #[test]
    fn test_click_selects_most_recent_on_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        // Two overlapping boxes.
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Create {
            rect: rect(150.0, 150.0, 350.0, 260.0),
            class: 1,
        });

        let outcome = session.apply(Event::Click { x: 200.0, y: 180.0 });
        assert_eq!(outcome, Outcome::Selected { id: 1 });
        assert_eq!(session.selected(), Some(1));
    }

    #[test]
    fn test_click_miss_keeps_previous_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Select { id: 0 });

        let outcome = session.apply(Event::Click { x: 700.0, y: 500.0 });
        assert_eq!(outcome, Outcome::NoOp);
        assert_eq!(session.selected(), Some(0));
    }

    #[test]
    fn test_click_margin_extends_the_hit_box() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });

        // 5 px outside the box edge, inside the margin.
        let outcome = session.apply(Event::Click { x: 305.0, y: 180.0 });
        assert_eq!(outcome, Outcome::Selected { id: 0 });
        // Well outside the margin.
        assert_eq!(
            session.apply(Event::Click { x: 320.0, y: 180.0 }),
            Outcome::NoOp
        );
    }

    #[test]
    fn test_delete_by_unknown_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        for i in 0..3 {
            session.apply(Event::Create {
                rect: rect(100.0 + 50.0 * i as f32, 100.0, 300.0, 220.0),
                class: 0,
            });
        }
        let before = fs::read_to_string(label_path(dir.path())).unwrap();

        let outcome = session.apply(Event::Delete(DeleteTarget::Id(5)));
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::UnknownId(5))
        ));
        assert_eq!(session.annotations().len(), 3);
        assert_eq!(fs::read_to_string(label_path(dir.path())).unwrap(), before);
    }

    #[test]
    fn test_delete_keeps_positions_dense_and_ids_stable() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        for i in 0..3 {
            session.apply(Event::Create {
                rect: rect(100.0 + 120.0 * i as f32, 100.0, 200.0 + 120.0 * i as f32, 220.0),
                class: 0,
            });
        }

        let outcome = session.apply(Event::Delete(DeleteTarget::Id(1)));
        assert!(matches!(outcome, Outcome::Deleted { id: 1, .. }));

        // Positions are a dense 0..n-1 in the original relative order;
        // surviving ids are untouched.
        let ids: Vec<_> = session.annotations().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(session.annotations().position_of(0), Some(0));
        assert_eq!(session.annotations().position_of(2), Some(1));

        let content = fs::read_to_string(label_path(dir.path())).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_delete_last_and_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });

        let outcome = session.apply(Event::Delete(DeleteTarget::Last));
        assert!(matches!(outcome, Outcome::Deleted { id: 0, .. }));
        // The now-empty set is persisted as file absence.
        assert!(!label_path(dir.path()).exists());

        let outcome = session.apply(Event::Delete(DeleteTarget::Last));
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::NothingToDelete)
        ));
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Select { id: 0 });

        let outcome = session.apply(Event::Delete(DeleteTarget::Selected));
        assert!(matches!(outcome, Outcome::Deleted { id: 0, .. }));
        assert_eq!(session.selected(), None);

        // Nothing selected anymore.
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        let outcome = session.apply(Event::Delete(DeleteTarget::Selected));
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::NoSelection)
        ));
    }

    #[test]
    fn test_class_reassignment_rewrites_only_the_target_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Create {
            rect: rect(400.0, 300.0, 500.0, 400.0),
            class: 0,
        });
        let before = fs::read_to_string(label_path(dir.path())).unwrap();
        let before_lines: Vec<&str> = before.lines().collect();

        session.apply(Event::Select { id: 1 });
        let outcome = session.apply(Event::SetClass { class: 1 });
        assert!(matches!(outcome, Outcome::ClassChanged { id: 1, .. }));

        let ann = session.annotations().by_id(1).unwrap();
        assert_eq!(ann.class_id, 1);
        assert_eq!(ann.class_name, "truck");
        // Selection survives so the UI can keep the box highlighted.
        assert_eq!(session.selected(), Some(1));

        let after = fs::read_to_string(label_path(dir.path())).unwrap();
        let after_lines: Vec<&str> = after.lines().collect();
        assert_eq!(after_lines[0], before_lines[0]);
        assert_ne!(after_lines[1], before_lines[1]);
        assert!(after_lines[1].starts_with("1 "));
    }

    #[test]
    fn test_set_class_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Select { id: 0 });

        let outcome = session.apply(Event::SetClass { class: 9 });
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::ClassOutOfRange { class: 9, max: 1 })
        ));
        assert_eq!(session.annotations().by_id(0).unwrap().class_id, 0);

        let outcome = session.apply(Event::SetClass { class: -1 });
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::ClassOutOfRange { class: -1, .. })
        ));
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });

        let outcome = session.apply(Event::Undo);
        assert!(matches!(
            outcome,
            Outcome::Undone { remaining: 0, .. }
        ));
        assert!(session.annotations().is_empty());
        // The restored empty state is persisted as file absence.
        assert!(!label_path(dir.path()).exists());

        let outcome = session.apply(Event::Undo);
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::NothingToUndo)
        ));
    }

    #[test]
    fn test_undo_for_another_image_is_rejected_and_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        assert_eq!(session.undo_count(), 1);

        session
            .open_image_with_dimensions("frame_0002.jpg", 800, 600)
            .unwrap();
        let outcome = session.apply(Event::Undo);
        assert!(matches!(
            outcome,
            Outcome::Rejected(RejectReason::UndoOtherImage)
        ));
        // The snapshot went back on the stack, unconsumed.
        assert_eq!(session.undo_count(), 1);

        // Back on the original image the same snapshot applies.
        session
            .open_image_with_dimensions("frame_0001.jpg", 800, 600)
            .unwrap();
        let outcome = session.apply(Event::Undo);
        assert!(matches!(outcome, Outcome::Undone { .. }));
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_open_image_supersedes_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Select { id: 0 });

        session
            .open_image_with_dimensions("frame_0002.jpg", 800, 600)
            .unwrap();
        assert!(session.annotations().is_empty());
        assert_eq!(session.selected(), None);

        // The first image's annotations are still on disk.
        session
            .open_image_with_dimensions("frame_0001.jpg", 800, 600)
            .unwrap();
        assert_eq!(session.annotations().len(), 1);
    }

    #[test]
    fn test_render_reflects_session_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.apply(Event::Create {
            rect: rect(100.0, 100.0, 300.0, 220.0),
            class: 0,
        });
        session.apply(Event::Select { id: 0 });

        let scene = session.render(&SceneStyle::default()).unwrap();
        assert_eq!(scene.boxes.len(), 1);
        assert!(scene.boxes[0].selected);
        assert_eq!((scene.width, scene.height), (800, 600));
    }
}
