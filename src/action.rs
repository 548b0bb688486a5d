//! The editor's action vocabulary.
//!
//! Actions are plain data so a UI can build them directly or send them as
//! JSON (`{"type": "deleteSlide", "slideIndex": 2}`).

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;
use crate::presentation::{Background, DesignSystem, ElementPatch, Presentation, Slide, SlideElement};

/// A discrete edit or navigation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Select a slide and clear element selection
    SelectSlide { index: usize },
    /// Select an element on the current slide, or clear the selection
    SelectElement { element_id: Option<ElementId> },
    UpdateElement {
        slide_index: usize,
        element_id: ElementId,
        changes: ElementPatch,
    },
    AddElement {
        slide_index: usize,
        element: SlideElement,
    },
    DeleteElement {
        slide_index: usize,
        element_id: ElementId,
    },
    DuplicateElement {
        slide_index: usize,
        element_id: ElementId,
    },
    /// Move an element within its slide's z-order
    ReorderElement {
        slide_index: usize,
        element_id: ElementId,
        to_index: usize,
    },
    UpdateSlideBackground {
        slide_index: usize,
        background: Background,
    },
    ReplaceSlide {
        slide_index: usize,
        slide: Slide,
    },
    AddSlide {
        slide: Slide,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_index: Option<usize>,
    },
    DuplicateSlide { slide_index: usize },
    DeleteSlide { slide_index: usize },
    ReorderSlides { from_index: usize, to_index: usize },
    UpdateDesignSystem { design_system: DesignSystem },
    /// Load a whole document; resets selection and history
    SetPresentation { presentation: Presentation },
    Undo,
    Redo,
    MarkSaved,
}

impl Action {
    /// Whether this action edits the document (and so records history)
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Action::SelectSlide { .. }
                | Action::SelectElement { .. }
                | Action::SetPresentation { .. }
                | Action::Undo
                | Action::Redo
                | Action::MarkSaved
        )
    }

    /// Get display name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Action::SelectSlide { .. } => "selectSlide",
            Action::SelectElement { .. } => "selectElement",
            Action::UpdateElement { .. } => "updateElement",
            Action::AddElement { .. } => "addElement",
            Action::DeleteElement { .. } => "deleteElement",
            Action::DuplicateElement { .. } => "duplicateElement",
            Action::ReorderElement { .. } => "reorderElement",
            Action::UpdateSlideBackground { .. } => "updateSlideBackground",
            Action::ReplaceSlide { .. } => "replaceSlide",
            Action::AddSlide { .. } => "addSlide",
            Action::DuplicateSlide { .. } => "duplicateSlide",
            Action::DeleteSlide { .. } => "deleteSlide",
            Action::ReorderSlides { .. } => "reorderSlides",
            Action::UpdateDesignSystem { .. } => "updateDesignSystem",
            Action::SetPresentation { .. } => "setPresentation",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::MarkSaved => "markSaved",
        }
    }
}
