//! In-memory presentation editing with bounded undo history and debounced
//! persistence.
//!
//! The pieces, leaves first:
//! - [`ids`]: slide, element and document identifiers
//! - [`presentation`]: the document model
//! - [`snapshot`]: immutable copies of the document for history
//! - [`history`]: bounded undo/redo stacks
//! - [`action`] / [`editor`]: the action vocabulary and the pure transition
//!   function [`editor::apply`]
//! - [`persist`]: debounced and immediate saves to a [`persist::store::DocumentStore`]
//! - [`session`]: ties one open document to its editor and saver
//!
//! ```
//! use deckedit::action::Action;
//! use deckedit::config::EditorConfig;
//! use deckedit::editor::{EditorState, apply};
//! use deckedit::ids::IdGenerator;
//! use deckedit::presentation::{Presentation, Slide};
//!
//! let doc = Presentation::blank(&mut IdGenerator::new());
//! let state = EditorState::new(doc, EditorConfig::default());
//!
//! let state = apply(&state, Action::AddSlide { slide: Slide::new("intro"), at_index: None });
//! assert_eq!(state.presentation().slide_count(), 2);
//! assert!(state.is_dirty());
//!
//! let state = apply(&state, Action::Undo);
//! assert_eq!(state.presentation().slide_count(), 1);
//! ```

pub mod action;
pub mod config;
pub mod editor;
pub mod history;
pub mod ids;
pub mod persist;
pub mod presentation;
pub mod session;
pub mod snapshot;

pub use action::Action;
pub use editor::{EditorState, apply};
pub use presentation::{Presentation, Slide, SlideElement};
