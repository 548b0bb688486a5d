//! An editing session: one open document, its editor state, and its saver.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::info;

use crate::action::Action;
use crate::config::Config;
use crate::editor::EditorState;
use crate::ids::DocumentId;
use crate::persist::store::DocumentStore;
use crate::persist::{PersistController, PersistEvent};
use crate::presentation::Presentation;

/// Shared handle to the session's editor state.
///
/// Actions run to completion under the lock, so they are applied strictly one
/// at a time in dispatch order. Readers get cheap `Arc` copies of the
/// presentation and never hold the lock across I/O.
#[derive(Debug, Clone)]
pub struct SharedEditor {
    state: Arc<Mutex<EditorState>>,
}

impl SharedEditor {
    pub fn new(state: EditorState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Apply an action. Returns true if the presentation changed.
    pub fn dispatch(&self, action: Action) -> bool {
        self.state.lock().dispatch(action)
    }

    /// The live presentation
    pub fn presentation(&self) -> Arc<Presentation> {
        Arc::clone(self.state.lock().presentation())
    }

    /// Run a closure against the current state
    pub fn read<R>(&self, f: impl FnOnce(&EditorState) -> R) -> R {
        f(&self.state.lock())
    }

    /// A copy of the whole editor state
    pub fn snapshot(&self) -> EditorState {
        self.state.lock().clone()
    }

    /// Clear the dirty flag if `saved` is still the live presentation.
    /// Returns whether the document is now clean.
    pub fn mark_saved_if_current(&self, saved: &Arc<Presentation>) -> bool {
        let mut state = self.state.lock();
        if Arc::ptr_eq(state.presentation(), saved) {
            state.dispatch(Action::MarkSaved);
        }
        !state.is_dirty()
    }
}

/// One open document being edited
#[derive(Debug)]
pub struct EditorSession<S> {
    document_id: DocumentId,
    editor: SharedEditor,
    persist: PersistController<S>,
}

impl<S: DocumentStore> EditorSession<S> {
    /// Fetch a document from the store and open it for editing
    pub async fn open(
        store: S,
        document_id: DocumentId,
        config: &Config,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PersistEvent>)> {
        let presentation = store
            .fetch(document_id)
            .await
            .with_context(|| format!("Failed to load document {}", document_id))?;
        info!(document = %document_id, slides = presentation.slide_count(), "document opened");

        let state = EditorState::new(presentation, config.editor.clone());
        Ok(Self::new(store, document_id, state, config))
    }

    /// Start a session on an already-built editor state
    pub fn new(
        store: S,
        document_id: DocumentId,
        state: EditorState,
        config: &Config,
    ) -> (Self, mpsc::UnboundedReceiver<PersistEvent>) {
        let editor = SharedEditor::new(state);
        let (persist, events) = PersistController::new(store, editor.clone(), &config.persist);
        let session = Self {
            document_id,
            editor,
            persist,
        };
        (session, events)
    }

    /// Apply an action and schedule a debounced save if it left unsaved
    /// changes. Loading a document replaces it without dirtying it, so a load
    /// never writes back.
    ///
    /// # Panics
    ///
    /// Scheduling spawns a tokio task, so this panics when called outside a
    /// tokio runtime.
    pub fn dispatch(&self, action: Action) -> bool {
        let changed = self.editor.dispatch(action);
        if changed && self.editor.read(|s| s.is_dirty()) {
            self.persist.schedule_save(self.document_id);
        }
        changed
    }

    /// Write the live document now, e.g. before navigating away
    pub async fn flush(&self) -> Result<()> {
        self.persist.save_now(self.document_id).await
    }

    /// Flush unsaved changes and stop pending work
    pub async fn close(self) -> Result<()> {
        let result = if self.editor.read(|s| s.is_dirty()) {
            self.flush().await
        } else {
            Ok(())
        };
        self.persist.cancel(self.document_id);
        result
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn editor(&self) -> &SharedEditor {
        &self.editor
    }

    pub fn persist(&self) -> &PersistController<S> {
        &self.persist
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::persist::store::MemoryStore;
    use crate::presentation::{Background, Slide};

    fn seeded_store() -> (MemoryStore, DocumentId) {
        let store = MemoryStore::new();
        let id = DocumentId::new();
        let doc = Presentation {
            title: "Launch".to_string(),
            slides: vec![Slide::new("s1"), Slide::new("s2")],
            design_system: Default::default(),
        };
        store.insert(id, doc);
        (store, id)
    }

    #[tokio::test(start_paused = true)]
    async fn open_loads_clean_document() {
        let (store, id) = seeded_store();
        let (session, _events) = EditorSession::open(store, id, &Config::default()).await.unwrap();

        let state = session.editor().snapshot();
        assert_eq!(state.presentation().title, "Launch");
        assert_eq!(state.selected_slide_index(), 0);
        assert!(!state.is_dirty());
        assert!(!state.can_undo());
    }

    #[tokio::test(start_paused = true)]
    async fn open_reports_missing_document() {
        let store = MemoryStore::new();
        let err = EditorSession::open(store, DocumentId::new(), &Config::default())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load document"));
    }

    #[tokio::test(start_paused = true)]
    async fn edits_autosave_after_quiet_period() {
        let (store, id) = seeded_store();
        let (session, _events) = EditorSession::open(store.clone(), id, &Config::default())
            .await
            .unwrap();

        assert!(!session.dispatch(Action::SelectSlide { index: 1 }));
        assert!(!session.persist().has_pending(id));

        assert!(session.dispatch(Action::DeleteSlide { slide_index: 0 }));
        assert!(session.persist().has_pending(id));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get(id).unwrap().slide_count(), 1);
        assert!(!session.editor().read(|s| s.is_dirty()));
    }

    #[tokio::test(start_paused = true)]
    async fn undo_is_persisted_too() {
        let (store, id) = seeded_store();
        let (session, _events) = EditorSession::open(store.clone(), id, &Config::default())
            .await
            .unwrap();

        session.dispatch(Action::UpdateSlideBackground {
            slide_index: 0,
            background: Background::Color {
                color: "#000000".to_string(),
            },
        });
        session.flush().await.unwrap();
        assert!(session.dispatch(Action::Undo));
        assert!(session.editor().read(|s| s.is_dirty()));

        session.close().await.unwrap();
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.get(id).unwrap().slides[0].background, Background::default());
    }

    #[tokio::test(start_paused = true)]
    async fn loading_a_document_does_not_write_it_back() {
        let (store, id) = seeded_store();
        let (session, _events) = EditorSession::open(store.clone(), id, &Config::default())
            .await
            .unwrap();

        let replacement = Presentation {
            title: "Other deck".to_string(),
            slides: vec![Slide::new("x")],
            design_system: Default::default(),
        };
        assert!(session.dispatch(Action::SetPresentation {
            presentation: replacement,
        }));
        assert!(!session.editor().read(|s| s.is_dirty()));
        assert!(!session.persist().has_pending(id));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.get(id).unwrap().title, "Launch");
    }

    fn session_without_runtime() -> EditorSession<MemoryStore> {
        let (store, id) = seeded_store();
        let state = EditorState::new(store.get(id).unwrap().as_ref().clone(), Default::default());
        let (session, _events) = EditorSession::new(store, id, state, &Config::default());
        session
    }

    #[test]
    fn navigation_needs_no_runtime() {
        let session = session_without_runtime();
        assert!(!session.dispatch(Action::SelectSlide { index: 1 }));
        assert_eq!(session.editor().read(|s| s.selected_slide_index()), 1);
    }

    #[test]
    #[should_panic]
    fn editing_outside_a_runtime_panics() {
        let session = session_without_runtime();
        session.dispatch(Action::DeleteSlide { slide_index: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn close_without_changes_writes_nothing() {
        let (store, id) = seeded_store();
        let (session, _events) = EditorSession::open(store.clone(), id, &Config::default())
            .await
            .unwrap();
        session.close().await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.write_count(), 0);
    }
}
