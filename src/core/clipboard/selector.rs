//! Filtering and keyboard cursor for the floating selector.
//!
//! Pure state; the window layer feeds it keys and clicks and acts on the
//! returned [`SelectorOutcome`].

use std::sync::{Arc, Mutex, MutexGuard};

use super::history::HistoryStore;
use crate::shared::types::{ClipboardEntry, SelectorKey, SelectorView};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorOutcome {
    /// Selection index changed
    Moved,
    /// Key was valid but hit a bound
    Unchanged,
    Confirmed(ClipboardEntry),
    Dismissed,
    /// Nothing to act on (empty list, bad index)
    Ignored,
}

#[derive(Debug, Default, Clone)]
pub struct SelectorState {
    query: String,
    history: Vec<ClipboardEntry>,
    filtered: Vec<ClipboardEntry>,
    selected: usize,
}

impl SelectorState {
    pub fn new(history: Vec<ClipboardEntry>) -> Self {
        let mut state = Self::default();
        state.reset(history);
        state
    }

    /// Fresh session: empty query, cursor on the newest entry
    pub fn reset(&mut self, history: Vec<ClipboardEntry>) {
        self.query.clear();
        self.history = history;
        self.apply_filter();
    }

    /// Swap in a newer history without touching the query.
    /// The cursor is clamped to the new list.
    pub fn refresh(&mut self, history: Vec<ClipboardEntry>) {
        self.history = history;
        let selected = self.selected;
        self.apply_filter();
        self.selected = selected.min(self.filtered.len().saturating_sub(1));
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let needle = self.query.to_lowercase();
        self.filtered = self
            .history
            .iter()
            .filter(|entry| entry.matches(&needle))
            .cloned()
            .collect();
        self.selected = 0;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filtered(&self) -> &[ClipboardEntry] {
        &self.filtered
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Last valid index, or -1 for an empty list
    pub fn max_index(&self) -> isize {
        self.filtered.len() as isize - 1
    }

    pub fn move_up(&mut self) -> SelectorOutcome {
        if self.max_index() < 0 {
            return SelectorOutcome::Ignored;
        }
        if self.selected == 0 {
            return SelectorOutcome::Unchanged;
        }
        self.selected -= 1;
        SelectorOutcome::Moved
    }

    pub fn move_down(&mut self) -> SelectorOutcome {
        let max = self.max_index();
        if max < 0 {
            return SelectorOutcome::Ignored;
        }
        if self.selected as isize >= max {
            return SelectorOutcome::Unchanged;
        }
        self.selected += 1;
        SelectorOutcome::Moved
    }

    pub fn handle_key(&mut self, key: SelectorKey) -> SelectorOutcome {
        match key {
            SelectorKey::Up => self.move_up(),
            SelectorKey::Down => self.move_down(),
            SelectorKey::Enter => self.click(self.selected),
            // Closing must work even when nothing matches
            SelectorKey::Escape => SelectorOutcome::Dismissed,
        }
    }

    /// Confirm the row at `index` of the filtered list
    pub fn click(&mut self, index: usize) -> SelectorOutcome {
        match self.filtered.get(index) {
            Some(entry) => {
                self.selected = index;
                SelectorOutcome::Confirmed(entry.clone())
            }
            None => SelectorOutcome::Ignored,
        }
    }

    pub fn view(&self) -> SelectorView {
        SelectorView {
            query: self.query.clone(),
            entries: self.filtered.clone(),
            selected_index: self.selected as u32,
            placeholder: self.history.is_empty(),
        }
    }
}

/// Selector state bound to the live history
pub struct ClipboardSelector {
    history: Arc<HistoryStore>,
    state: Mutex<SelectorState>,
}

impl ClipboardSelector {
    pub fn new(history: Arc<HistoryStore>) -> Self {
        let state = SelectorState::new(history.entries());
        Self {
            history,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SelectorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn reset(&self) -> SelectorView {
        let mut state = self.lock();
        state.reset(self.history.entries());
        state.view()
    }

    pub fn refresh(&self, history: Vec<ClipboardEntry>) -> SelectorView {
        let mut state = self.lock();
        state.refresh(history);
        state.view()
    }

    pub fn set_query(&self, query: &str) -> SelectorView {
        let mut state = self.lock();
        state.set_query(query);
        state.view()
    }

    pub fn handle_key(&self, key: SelectorKey) -> (SelectorOutcome, SelectorView) {
        let mut state = self.lock();
        let outcome = state.handle_key(key);
        (outcome, state.view())
    }

    pub fn click(&self, index: usize) -> (SelectorOutcome, SelectorView) {
        let mut state = self.lock();
        let outcome = state.click(index);
        (outcome, state.view())
    }

    pub fn view(&self) -> SelectorView {
        self.lock().view()
    }
}
