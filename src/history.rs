//! Bounded linear undo/redo history over presentation snapshots.

use std::collections::VecDeque;

use crate::snapshot::Snapshot;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

/// Manages undo/redo with document snapshots
#[derive(Debug, Clone)]
pub struct History {
    /// Pre-mutation snapshots, oldest at the front
    undo_stack: VecDeque<Snapshot>,
    /// Snapshots displaced by undo
    redo_stack: Vec<Snapshot>,
    /// Maximum undo depth
    limit: usize,
}

impl History {
    /// Create an empty history keeping at most `limit` undo steps
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Record the state before a mutation. Invalidates redo.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        self.redo_stack.clear();

        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    /// Step back: returns the snapshot to restore, parking `current` for redo
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward: returns the snapshot to restore, parking `current` for undo
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Most recent undo entry
    pub fn last_undo(&self) -> Option<&Snapshot> {
        self.undo_stack.back()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::presentation::Presentation;

    fn snap(title: &str) -> Snapshot {
        let doc = Presentation {
            title: title.to_string(),
            slides: Vec::new(),
            design_system: Default::default(),
        };
        Snapshot::capture(&Arc::new(doc), 0, None)
    }

    fn title(s: &Snapshot) -> &str {
        &s.presentation().title
    }

    #[test]
    fn undo_and_redo_swap_through_current() {
        let mut history = History::new(5);
        history.record(snap("a"));

        let restored = history.undo(snap("b")).unwrap();
        assert_eq!(title(&restored), "a");
        assert_eq!(history.redo_count(), 1);

        let again = history.redo(snap("a")).unwrap();
        assert_eq!(title(&again), "b");
        assert_eq!(history.undo_count(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut history = History::default();
        assert!(history.undo(snap("x")).is_none());
        assert!(history.redo(snap("x")).is_none());
        assert_eq!(history.redo_count(), 0);
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn record_drops_oldest_beyond_limit() {
        let mut history = History::new(3);
        for t in ["1", "2", "3", "4", "5"] {
            history.record(snap(t));
        }
        assert_eq!(history.undo_count(), 3);
        assert_eq!(title(history.last_undo().unwrap()), "5");

        let mut seen = Vec::new();
        while let Some(s) = history.undo(snap("cur")) {
            seen.push(title(&s).to_string());
        }
        assert_eq!(seen, ["5", "4", "3"]);
    }

    #[test]
    fn record_clears_redo() {
        let mut history = History::default();
        history.record(snap("a"));
        history.undo(snap("b"));
        assert!(history.can_redo());

        history.record(snap("c"));
        assert!(!history.can_redo());
        assert!(history.redo(snap("c")).is_none());
    }
}
