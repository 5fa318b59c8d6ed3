//! Review and correction of YOLO bounding-box annotations.
//!
//! This crate is the data-model and reconciliation core behind an
//! interactive review dashboard. The hosting UI layer translates user
//! gestures into [`Event`] values, hands them to a [`ReviewSession`],
//! and draws the [`Scene`] the session renders back; everything else —
//! coordinate conversion, label-file persistence, undo snapshots,
//! class configuration — lives here.
//!
//! Label files use the YOLO text format: one `.txt` per image sharing
//! the image's base name, one `class_id x_center y_center width height`
//! line per box, all geometry normalized to `[0, 1]`. An image with no
//! annotations has no label file.

pub mod config;
pub mod coords;
pub mod dataset;
pub mod error;
pub mod labels;
pub mod model;
pub mod scene;
pub mod session;
pub mod undo;

pub use dataset::DatasetPaths;
pub use error::{DatasetError, LabelError};
pub use labels::LabelStore;
pub use model::{Annotation, AnnotationId, AnnotationSet, ClassTable, ImageRef};
pub use scene::{Scene, SceneStyle};
pub use session::{
    CanvasRect, DeleteTarget, Event, Outcome, PartialCorners, RejectReason, ReviewSession,
    WriteStatus,
};
pub use undo::{UndoSnapshot, UndoStack};
