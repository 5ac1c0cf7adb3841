//! Undo/redo history over editor state snapshots.
//!
//! Snapshots are `Arc<EditorState>`; pushing one clones the `Arc`, not the
//! state, and the persistent collections inside keep the snapshots sharing
//! storage. A reduction that returns the identical `Arc` is discarded
//! without touching the stacks, so no-op actions never create empty history
//! entries.

use crate::actions::{reduce, EditorAction};
use crate::editor::EditorState;
use std::collections::VecDeque;
use std::sync::Arc;

/// Past/present/future snapshot stacks around the reducer.
#[derive(Debug, Clone)]
pub struct UndoableState {
    /// Oldest snapshot at the front, most recent at the back.
    past: VecDeque<Arc<EditorState>>,
    present: Arc<EditorState>,
    /// Next redo target at the front.
    future: VecDeque<Arc<EditorState>>,
    /// Maximum number of past snapshots; `None` keeps everything.
    capacity: Option<usize>,
}

impl UndoableState {
    /// An unbounded history starting at `initial`.
    pub fn new(initial: EditorState) -> Self {
        Self {
            past: VecDeque::new(),
            present: Arc::new(initial),
            future: VecDeque::new(),
            capacity: None,
        }
    }

    /// A history that keeps at most `capacity` undo steps, evicting the
    /// oldest snapshot on overflow.
    pub fn with_capacity(initial: EditorState, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(initial)
        }
    }

    pub fn present(&self) -> &Arc<EditorState> {
        &self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Reduce `action` against the present state. Returns whether a new
    /// snapshot was recorded.
    pub fn dispatch(&mut self, action: &EditorAction) -> bool {
        let next = reduce(&self.present, action);
        if Arc::ptr_eq(&next, &self.present) {
            return false;
        }

        self.past.push_back(Arc::clone(&self.present));
        if let Some(capacity) = self.capacity {
            while self.past.len() > capacity {
                self.past.pop_front();
            }
        }
        self.present = next;
        self.future.clear();
        log::debug!(
            "dispatched {action:?}: {} undo / {} redo steps",
            self.past.len(),
            self.future.len()
        );
        true
    }

    /// Step back to the previous snapshot. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        match self.past.pop_back() {
            Some(previous) => {
                self.future.push_front(Arc::clone(&self.present));
                self.present = previous;
                true
            }
            None => false,
        }
    }

    /// Step forward again. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        match self.future.pop_front() {
            Some(next) => {
                self.past.push_back(Arc::clone(&self.present));
                self.present = next;
                true
            }
            None => false,
        }
    }
}
