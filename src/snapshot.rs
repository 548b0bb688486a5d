//! Immutable presentation snapshots for undo/redo.
//!
//! The live presentation and every history entry are held behind `Arc`s and
//! never mutated in place: an edit deep-copies the current value, changes the
//! copy and installs it as a new `Arc`. A snapshot taken before the edit keeps
//! pointing at the old value, so history can never observe later edits.

use std::sync::Arc;

use crate::ids::ElementId;
use crate::presentation::Presentation;

/// Structurally independent copy of a presentation.
///
/// Every nested sequence is owned, so `Clone` recurses all the way down and the
/// result shares nothing mutable with the original.
pub fn deep_clone(presentation: &Presentation) -> Presentation {
    presentation.clone()
}

/// A point-in-time copy of the document plus the selection that went with it
#[derive(Debug, Clone)]
pub struct Snapshot {
    presentation: Arc<Presentation>,
    selected_slide_index: usize,
    selected_element_id: Option<ElementId>,
}

impl Snapshot {
    /// Capture a snapshot. The `Arc` is shared, never written through.
    pub fn capture(
        presentation: &Arc<Presentation>,
        selected_slide_index: usize,
        selected_element_id: Option<ElementId>,
    ) -> Self {
        Self {
            presentation: Arc::clone(presentation),
            selected_slide_index,
            selected_element_id,
        }
    }

    pub fn presentation(&self) -> &Arc<Presentation> {
        &self.presentation
    }

    pub fn selected_slide_index(&self) -> usize {
        self.selected_slide_index
    }

    pub fn selected_element_id(&self) -> Option<&ElementId> {
        self.selected_element_id.as_ref()
    }
}
