//! Saving the live presentation to a document store.
//!
//! Two paths push the current document out:
//! - [`PersistController::schedule_save`] debounces: each call restarts a timer,
//!   and only the last call in a burst writes, with whatever the document looks
//!   like when the timer fires.
//! - [`PersistController::save_now`] cancels the timer and writes immediately.
//!
//! Writes to the same document are serialised, and each write reads the live
//! document only once it holds the write lock. The store therefore sees writes
//! in order, and the newest content always lands last.

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PersistConfig;
use crate::ids::DocumentId;
use crate::session::SharedEditor;
use store::{DocumentPatch, DocumentStore};

/// Events from the persistence controller to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistEvent {
    /// A write succeeded
    Saved { document_id: DocumentId },
    /// A write failed; the in-memory document is unchanged
    Failed { document_id: DocumentId, error: String },
}

/// A debounce timer waiting to fire
struct PendingSave {
    token: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Timers {
    next_token: u64,
    pending: HashMap<DocumentId, PendingSave>,
}

struct Inner<S> {
    store: S,
    editor: SharedEditor,
    debounce: Duration,
    timers: Mutex<Timers>,
    /// One async lock per document so writes never overlap
    write_locks: Mutex<HashMap<DocumentId, Arc<tokio::sync::Mutex<()>>>>,
    events: mpsc::UnboundedSender<PersistEvent>,
}

/// Debounced and immediate saving of the live presentation
pub struct PersistController<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for PersistController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for PersistController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistController")
            .field("debounce", &self.inner.debounce)
            .finish()
    }
}

impl<S: DocumentStore> PersistController<S> {
    /// Create a controller saving `editor`'s document to `store`.
    ///
    /// The returned receiver gets a [`PersistEvent`] per completed write; it
    /// may be dropped if nobody is interested.
    pub fn new(
        store: S,
        editor: SharedEditor,
        config: &PersistConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PersistEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            inner: Arc::new(Inner {
                store,
                editor,
                debounce: config.debounce(),
                timers: Mutex::new(Timers::default()),
                write_locks: Mutex::new(HashMap::new()),
                events,
            }),
        };
        (controller, events_rx)
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Schedule a save after the debounce window, replacing any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_save(&self, document_id: DocumentId) {
        let mut timers = self.inner.timers.lock();
        if let Some(previous) = timers.pending.remove(&document_id) {
            previous.handle.abort();
        }

        timers.next_token = timers.next_token.wrapping_add(1);
        let token = timers.next_token;
        let this = self.clone();
        let debounce = self.inner.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Leave the pending map before writing so a later cancel cannot
            // abort the write halfway through
            {
                let mut timers = this.inner.timers.lock();
                let current = timers.pending.get(&document_id).map(|entry| entry.token);
                if current != Some(token) {
                    return;
                }
                timers.pending.remove(&document_id);
            }

            // Failures are already logged and reported as events
            let _ = this.write(document_id).await;
        });

        timers.pending.insert(document_id, PendingSave { token, handle });
        debug!(document = %document_id, delay = ?debounce, "save scheduled");
    }

    /// Cancel any pending debounced save and write immediately
    pub async fn save_now(&self, document_id: DocumentId) -> Result<()> {
        self.cancel(document_id);
        self.write(document_id).await
    }

    /// Cancel a pending debounced save. Writes already in flight are not affected.
    pub fn cancel(&self, document_id: DocumentId) {
        if let Some(previous) = self.inner.timers.lock().pending.remove(&document_id) {
            previous.handle.abort();
            debug!(document = %document_id, "pending save cancelled");
        }
    }

    /// Whether a debounced save is waiting to fire
    pub fn has_pending(&self, document_id: DocumentId) -> bool {
        self.inner.timers.lock().pending.contains_key(&document_id)
    }

    fn write_lock(&self, document_id: DocumentId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.write_locks.lock();
        Arc::clone(locks.entry(document_id).or_default())
    }

    /// Forget a document's write lock once no writer holds or awaits it
    fn release_write_lock(&self, document_id: DocumentId, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.inner.write_locks.lock();
        drop(lock);
        if locks
            .get(&document_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&document_id);
        }
    }

    #[cfg(test)]
    fn tracked_write_locks(&self) -> usize {
        self.inner.write_locks.lock().len()
    }

    async fn write(&self, document_id: DocumentId) -> Result<()> {
        let lock = self.write_lock(document_id);
        let result = {
            let _guard = lock.lock().await;
            self.write_latest(document_id).await
        };
        self.release_write_lock(document_id, lock);
        result
    }

    async fn write_latest(&self, document_id: DocumentId) -> Result<()> {
        let presentation = self.inner.editor.presentation();
        let body = DocumentPatch {
            presentation: Arc::clone(&presentation),
        };

        match self.inner.store.patch(document_id, &body).await {
            Ok(()) => {
                let clean = self.inner.editor.mark_saved_if_current(&presentation);
                info!(document = %document_id, clean, "document saved");
                let _ = self.inner.events.send(PersistEvent::Saved { document_id });
                Ok(())
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(document = %document_id, error = %error, "save failed");
                let _ = self.inner.events.send(PersistEvent::Failed { document_id, error });
                Err(e)
            }
        }
    }
}
