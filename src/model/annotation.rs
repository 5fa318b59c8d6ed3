//! Annotation records and the per-image annotation set.

use serde::{Deserialize, Serialize};

use super::ClassTable;

/// Stable identifier for an annotation within one image's set.
///
/// Handed out by [`AnnotationSet`] in increasing order and never reused,
/// so a deletion does not shift the ids of the remaining annotations.
/// The *positional index* (0..n-1 in list order) is a display concern
/// recomputed on read.
pub type AnnotationId = u32;

/// One detected object instance on one image.
///
/// Geometry is stored in YOLO normalized form: center point and size as
/// fractions of the image dimensions, all four fields in `[0, 1]` with
/// strictly positive width and height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Stable identifier within the owning set.
    pub id: AnnotationId,
    /// Index into the class table.
    pub class_id: usize,
    /// Cached copy of the class name; kept in sync with `class_id`.
    pub class_name: String,
    /// Box center x as a fraction of image width.
    pub x_center: f32,
    /// Box center y as a fraction of image height.
    pub y_center: f32,
    /// Box width as a fraction of image width.
    pub width: f32,
    /// Box height as a fraction of image height.
    pub height: f32,
}

impl Annotation {
    /// Create an annotation from its parts.
    pub fn new(
        id: AnnotationId,
        class_id: usize,
        class_name: impl Into<String>,
        geometry: (f32, f32, f32, f32),
    ) -> Self {
        let (x_center, y_center, width, height) = geometry;
        Self {
            id,
            class_id,
            class_name: class_name.into(),
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Reassign the class, keeping `class_name` in sync with `class_id`.
    ///
    /// Returns `false` (and changes nothing) if `class_id` is not in the
    /// table.
    pub fn set_class(&mut self, class_id: usize, classes: &ClassTable) -> bool {
        match classes.name(class_id) {
            Some(name) => {
                self.class_id = class_id;
                self.class_name = name.to_string();
                true
            }
            None => false,
        }
    }
}

/// The ordered annotations of one image.
///
/// List order is creation order and defines the positional index shown
/// to the user. Mutations go through the owning session; the set itself
/// only manages ordering and id assignment. Cloning produces the deep
/// copy used for undo snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    items: Vec<Annotation>,
    next_id: AnnotationId,
}

impl AnnotationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set holds no annotations.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    /// Annotation at a positional index.
    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.items.get(index)
    }

    /// Mutable annotation at a positional index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Annotation> {
        self.items.get_mut(index)
    }

    /// The most recently created annotation.
    pub fn last(&self) -> Option<&Annotation> {
        self.items.last()
    }

    /// Look up an annotation by stable id.
    pub fn by_id(&self, id: AnnotationId) -> Option<&Annotation> {
        self.items.iter().find(|ann| ann.id == id)
    }

    /// Mutable lookup by stable id.
    pub fn by_id_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.items.iter_mut().find(|ann| ann.id == id)
    }

    /// Positional index of an annotation by stable id.
    pub fn position_of(&self, id: AnnotationId) -> Option<usize> {
        self.items.iter().position(|ann| ann.id == id)
    }

    /// Append a new annotation, assigning the next stable id.
    pub fn push(
        &mut self,
        class_id: usize,
        class_name: &str,
        geometry: (f32, f32, f32, f32),
    ) -> AnnotationId {
        let id = self.next_id;
        self.next_id += 1;
        self.items
            .push(Annotation::new(id, class_id, class_name, geometry));
        id
    }

    /// Remove an annotation by stable id, preserving the order of the
    /// rest. The freed id is not reused.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.position_of(id)?;
        Some(self.items.remove(index))
    }
}
