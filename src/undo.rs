//! Undo support: bounded snapshots of an image's annotation list.
//!
//! Every mutating operation deep-copies the annotation set it is about
//! to change and pushes the copy here. Undo pops the most recent
//! snapshot. There is no redo stack: callers that want redo must
//! re-push before mutating again.
//!
//! The stack is not scoped to one image. Callers restoring a snapshot
//! must check its `image_key` against the active image and put a
//! mismatching snapshot back unconsumed (see
//! [`UndoStack::push_back`]) instead of restoring another image's
//! annotations.

use crate::model::AnnotationSet;

/// Default number of undo steps kept before the oldest is dropped.
pub const DEFAULT_MAX_STEPS: usize = 20;

/// A deep copy of one image's annotations, taken just before a mutation.
#[derive(Debug, Clone)]
pub struct UndoSnapshot {
    /// Filename of the image the snapshot belongs to.
    pub image_key: String,
    /// The annotation list as it was before the mutation.
    pub annotations: AnnotationSet,
}

/// Bounded LIFO stack of undo snapshots.
///
/// Pushes append at the top; overflowing the capacity drops entries
/// from the bottom, so the stack always holds the most recent
/// `max_steps` snapshots.
#[derive(Debug, Clone)]
pub struct UndoStack {
    stack: Vec<UndoSnapshot>,
    max_steps: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl UndoStack {
    /// An empty stack holding at most `max_steps` snapshots.
    pub fn new(max_steps: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_steps,
        }
    }

    /// Snapshot `annotations` for `image_key` ahead of a mutation.
    pub fn push_state(&mut self, image_key: &str, annotations: &AnnotationSet) {
        log::debug!(
            "undo: snapshot of {} ({} annotations)",
            image_key,
            annotations.len()
        );
        self.stack.push(UndoSnapshot {
            image_key: image_key.to_string(),
            annotations: annotations.clone(),
        });
        while self.stack.len() > self.max_steps {
            self.stack.remove(0);
        }
    }

    /// Pop the most recent snapshot, or `None` if there is nothing to
    /// undo. Popping an empty stack is not an error.
    pub fn pop_state(&mut self) -> Option<UndoSnapshot> {
        let snapshot = self.stack.pop()?;
        log::debug!("undo: restoring {}", snapshot.image_key);
        Some(snapshot)
    }

    /// Put a popped snapshot back on top, unconsumed. Used when the
    /// snapshot belongs to a different image than the active one.
    pub fn push_back(&mut self, snapshot: UndoSnapshot) {
        self.stack.push(snapshot);
    }

    /// Whether a snapshot is available.
    pub fn can_undo(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Number of snapshots currently held.
    pub fn undo_count(&self) -> usize {
        self.stack.len()
    }

    /// Drop all snapshots.
    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Most recent snapshot for a specific image, without popping.
    pub fn last_for_image(&self, image_key: &str) -> Option<&UndoSnapshot> {
        self.stack.iter().rev().find(|s| s.image_key == image_key)
    }
}
