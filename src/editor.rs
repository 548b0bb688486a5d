//! Editor state and the transition function.
//!
//! [`apply`] maps `(state, action)` to the next state without touching its
//! input. Every document edit follows the same path:
//!
//! 1. resolve the target (slide index, element id); a missing target makes the
//!    whole action a no-op,
//! 2. deep-copy the live presentation and edit the copy,
//! 3. record the old presentation and selection in history, clear redo, and
//!    install the copy as the new live value, marked dirty.
//!
//! Selection-only actions skip step 3 entirely.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::action::Action;
use crate::config::EditorConfig;
use crate::history::History;
use crate::ids::{ElementId, IdGenerator};
use crate::presentation::{
    Background, DesignSystem, ElementPatch, Presentation, Slide, SlideElement,
};
use crate::snapshot::{Snapshot, deep_clone};

/// Compute the state that results from applying `action` to `state`
pub fn apply(state: &EditorState, action: Action) -> EditorState {
    let mut next = state.clone();
    next.dispatch(action);
    next
}

/// Outcome of a document edit: the new document and the selection to go with it
struct Edit {
    presentation: Presentation,
    slide_index: usize,
    element_id: Option<ElementId>,
}

/// Everything one editing session knows about the open presentation
#[derive(Debug, Clone)]
pub struct EditorState {
    presentation: Arc<Presentation>,
    selected_slide_index: usize,
    selected_element_id: Option<ElementId>,
    history: History,
    dirty: bool,
    ids: IdGenerator,
    config: EditorConfig,
}

impl EditorState {
    /// Open a session on an existing presentation
    pub fn new(presentation: Presentation, config: EditorConfig) -> Self {
        Self::with_ids(presentation, config, IdGenerator::new())
    }

    /// Open a session with a specific id generator
    pub fn with_ids(mut presentation: Presentation, config: EditorConfig, mut ids: IdGenerator) -> Self {
        presentation.normalize(&mut ids);
        Self {
            presentation: Arc::new(presentation),
            selected_slide_index: 0,
            selected_element_id: None,
            history: History::new(config.history_limit),
            dirty: false,
            ids,
            config,
        }
    }

    /// Apply an action in place. Returns true if the presentation changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let before = Arc::clone(&self.presentation);

        if action.is_mutation() {
            let name = action.name();
            match self.resolve(action) {
                Some(edit) => self.commit(edit),
                None => trace!(action = name, "edit has no effect, ignoring"),
            }
        } else {
            match action {
                Action::SelectSlide { index } => self.select_slide(index),
                Action::SelectElement { element_id } => self.select_element(element_id),
                Action::SetPresentation { presentation } => self.set_presentation(presentation),
                Action::Undo => self.undo(),
                Action::Redo => self.redo(),
                Action::MarkSaved => self.dirty = false,
                _ => {}
            }
        }

        !Arc::ptr_eq(&before, &self.presentation)
    }

    /// Compute a document edit, or `None` if the action has no effect
    fn resolve(&mut self, action: Action) -> Option<Edit> {
        match action {
            Action::UpdateElement {
                slide_index,
                element_id,
                changes,
            } => self.update_element(slide_index, &element_id, &changes),
            Action::AddElement { slide_index, element } => self.add_element(slide_index, element),
            Action::DeleteElement {
                slide_index,
                element_id,
            } => self.delete_element(slide_index, &element_id),
            Action::DuplicateElement {
                slide_index,
                element_id,
            } => self.duplicate_element(slide_index, &element_id),
            Action::ReorderElement {
                slide_index,
                element_id,
                to_index,
            } => self.reorder_element(slide_index, &element_id, to_index),
            Action::UpdateSlideBackground {
                slide_index,
                background,
            } => self.update_slide_background(slide_index, background),
            Action::ReplaceSlide { slide_index, slide } => self.replace_slide(slide_index, slide),
            Action::AddSlide { slide, at_index } => self.add_slide(slide, at_index),
            Action::DuplicateSlide { slide_index } => self.duplicate_slide(slide_index),
            Action::DeleteSlide { slide_index } => self.delete_slide(slide_index),
            Action::ReorderSlides {
                from_index,
                to_index,
            } => self.reorder_slides(from_index, to_index),
            Action::UpdateDesignSystem { design_system } => self.update_design_system(design_system),
            _ => None,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            &self.presentation,
            self.selected_slide_index,
            self.selected_element_id.clone(),
        )
    }

    fn commit(&mut self, edit: Edit) {
        self.history.record(self.snapshot());
        self.presentation = Arc::new(edit.presentation);
        self.selected_slide_index = edit.slide_index;
        self.selected_element_id = edit.element_id;
        self.dirty = true;
        self.clamp_selection();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.presentation = Arc::clone(snapshot.presentation());
        self.selected_slide_index = snapshot.selected_slide_index();
        self.selected_element_id = snapshot.selected_element_id().cloned();
        self.dirty = true;
        self.clamp_selection();
    }

    /// Keep the slide index in range and the element selection on that slide
    fn clamp_selection(&mut self) {
        let last = self.presentation.slide_count().saturating_sub(1);
        self.selected_slide_index = self.selected_slide_index.min(last);

        if let Some(id) = &self.selected_element_id {
            let present = self
                .presentation
                .slide(self.selected_slide_index)
                .is_some_and(|slide| slide.contains_element(id));
            if !present {
                self.selected_element_id = None;
            }
        }
    }

    /// Selection unchanged
    fn keep_selection(&self, presentation: Presentation) -> Edit {
        Edit {
            presentation,
            slide_index: self.selected_slide_index,
            element_id: self.selected_element_id.clone(),
        }
    }

    // --- Selection ---

    fn select_slide(&mut self, index: usize) {
        if index >= self.presentation.slide_count() {
            trace!(index, "slide index out of range, ignoring");
            return;
        }
        self.selected_slide_index = index;
        self.selected_element_id = None;
    }

    fn select_element(&mut self, element_id: Option<ElementId>) {
        match element_id {
            Some(id) if !self.selected_slide().contains_element(&id) => {
                trace!(element = %id, "element not on selected slide, ignoring");
            }
            id => self.selected_element_id = id,
        }
    }

    // --- Element edits ---

    fn update_element(&mut self, slide_index: usize, element_id: &ElementId, changes: &ElementPatch) -> Option<Edit> {
        let index = self.presentation.slide(slide_index)?.element_index(element_id)?;

        let mut doc = deep_clone(&self.presentation);
        match doc.slides[slide_index].elements[index].apply_patch(changes) {
            Ok(true) => Some(self.keep_selection(doc)),
            Ok(false) => None,
            Err(e) => {
                debug!(element = %element_id, error = %e, "patch does not fit element, ignoring");
                None
            }
        }
    }

    fn add_element(&mut self, slide_index: usize, mut element: SlideElement) -> Option<Edit> {
        let slide = self.presentation.slide(slide_index)?;
        if slide.contains_element(&element.id) {
            element.id = self.ids.next_element_id(&self.presentation.all_ids());
        }

        let id = element.id.clone();
        let mut doc = deep_clone(&self.presentation);
        doc.slides[slide_index].elements.push(element);
        Some(Edit {
            presentation: doc,
            slide_index,
            element_id: Some(id),
        })
    }

    fn delete_element(&mut self, slide_index: usize, element_id: &ElementId) -> Option<Edit> {
        let index = self.presentation.slide(slide_index)?.element_index(element_id)?;

        let mut doc = deep_clone(&self.presentation);
        doc.slides[slide_index].elements.remove(index);

        let mut edit = self.keep_selection(doc);
        if edit.element_id.as_ref() == Some(element_id) {
            edit.element_id = None;
        }
        Some(edit)
    }

    fn duplicate_element(&mut self, slide_index: usize, element_id: &ElementId) -> Option<Edit> {
        let source = self.presentation.slide(slide_index)?.element(element_id)?;

        let offset = self.config.duplicate_offset;
        let mut copy = source.clone();
        copy.id = self.ids.next_element_id(&self.presentation.all_ids());
        copy.position = copy.position.translated(offset, offset);

        let id = copy.id.clone();
        let mut doc = deep_clone(&self.presentation);
        doc.slides[slide_index].elements.push(copy);
        Some(Edit {
            presentation: doc,
            slide_index,
            element_id: Some(id),
        })
    }

    fn reorder_element(&mut self, slide_index: usize, element_id: &ElementId, to_index: usize) -> Option<Edit> {
        let slide = self.presentation.slide(slide_index)?;
        let from = slide.element_index(element_id)?;
        let to = to_index.min(slide.elements.len() - 1);
        if from == to {
            return None;
        }

        let mut doc = deep_clone(&self.presentation);
        let elements = &mut doc.slides[slide_index].elements;
        let element = elements.remove(from);
        elements.insert(to, element);
        Some(self.keep_selection(doc))
    }

    // --- Slide edits ---

    fn update_slide_background(&mut self, slide_index: usize, background: Background) -> Option<Edit> {
        if self.presentation.slide(slide_index)?.background == background {
            return None;
        }

        let mut doc = deep_clone(&self.presentation);
        doc.slides[slide_index].background = background;
        Some(self.keep_selection(doc))
    }

    fn replace_slide(&mut self, slide_index: usize, slide: Slide) -> Option<Edit> {
        self.presentation.slide(slide_index)?;

        // Check id collisions only against the other slides
        let mut doc = deep_clone(&self.presentation);
        doc.slides.remove(slide_index);
        let slide = doc.adopt_slide(slide, &mut self.ids);
        doc.slides.insert(slide_index, slide);

        Some(Edit {
            presentation: doc,
            slide_index: self.selected_slide_index,
            element_id: None,
        })
    }

    fn add_slide(&mut self, slide: Slide, at_index: Option<usize>) -> Option<Edit> {
        let mut doc = deep_clone(&self.presentation);
        let slide = doc.adopt_slide(slide, &mut self.ids);
        let index = at_index.unwrap_or(doc.slides.len()).min(doc.slides.len());
        doc.slides.insert(index, slide);

        Some(Edit {
            presentation: doc,
            slide_index: index,
            element_id: None,
        })
    }

    fn duplicate_slide(&mut self, slide_index: usize) -> Option<Edit> {
        let source = self.presentation.slide(slide_index)?;

        let mut taken = self.presentation.all_ids();
        let mut copy = source.clone();
        copy.id = self.ids.next_slide_id(&taken);
        taken.insert(copy.id.0.clone());
        for element in &mut copy.elements {
            element.id = self.ids.next_element_id(&taken);
            taken.insert(element.id.0.clone());
        }

        let mut doc = deep_clone(&self.presentation);
        doc.slides.insert(slide_index + 1, copy);
        Some(Edit {
            presentation: doc,
            slide_index: slide_index + 1,
            element_id: None,
        })
    }

    fn delete_slide(&mut self, slide_index: usize) -> Option<Edit> {
        let count = self.presentation.slide_count();
        if count <= 1 {
            trace!("refusing to delete the only slide");
            return None;
        }
        if slide_index >= count {
            return None;
        }

        let selected_id = self.selected_slide().id.clone();
        let mut doc = deep_clone(&self.presentation);
        doc.slides.remove(slide_index);

        let index = self.selected_slide_index.min(doc.slides.len() - 1);
        let same_slide = doc.slides[index].id == selected_id;
        Some(Edit {
            presentation: doc,
            slide_index: index,
            element_id: self.selected_element_id.clone().filter(|_| same_slide),
        })
    }

    fn reorder_slides(&mut self, from_index: usize, to_index: usize) -> Option<Edit> {
        let count = self.presentation.slide_count();
        if from_index >= count || to_index >= count || from_index == to_index {
            return None;
        }

        let mut doc = deep_clone(&self.presentation);
        let slide = doc.slides.remove(from_index);
        doc.slides.insert(to_index, slide);

        let moved_selected = from_index == self.selected_slide_index;
        Some(Edit {
            presentation: doc,
            slide_index: to_index,
            element_id: self.selected_element_id.clone().filter(|_| moved_selected),
        })
    }

    fn update_design_system(&mut self, design_system: DesignSystem) -> Option<Edit> {
        if self.presentation.design_system == design_system {
            return None;
        }

        let mut doc = deep_clone(&self.presentation);
        doc.design_system = design_system;
        Some(self.keep_selection(doc))
    }

    // --- Load and history ---

    fn set_presentation(&mut self, mut presentation: Presentation) {
        presentation.normalize(&mut self.ids);
        self.presentation = Arc::new(presentation);
        self.selected_slide_index = 0;
        self.selected_element_id = None;
        self.history.clear();
        self.dirty = false;
    }

    fn undo(&mut self) {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                debug!(undo = self.history.undo_count(), redo = self.history.redo_count(), "undo");
            }
            None => trace!("nothing to undo"),
        }
    }

    fn redo(&mut self) {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                debug!(undo = self.history.undo_count(), redo = self.history.redo_count(), "redo");
            }
            None => trace!("nothing to redo"),
        }
    }

    // --- Accessors ---

    pub fn presentation(&self) -> &Arc<Presentation> {
        &self.presentation
    }

    pub fn selected_slide_index(&self) -> usize {
        self.selected_slide_index
    }

    pub fn selected_slide(&self) -> &Slide {
        &self.presentation.slides[self.selected_slide_index]
    }

    pub fn selected_element_id(&self) -> Option<&ElementId> {
        self.selected_element_id.as_ref()
    }

    pub fn selected_element(&self) -> Option<&SlideElement> {
        let id = self.selected_element_id.as_ref()?;
        self.selected_slide().element(id)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}
