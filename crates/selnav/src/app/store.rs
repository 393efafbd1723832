//! Back/forward stacks for selection history.

use crate::domain::errors::NavigationError;
use crate::domain::model::SelectionRecord;

/// Default cap on the number of back entries kept.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Dual-stack history around the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStore<E, S> {
    /// Record of the selection currently committed, if anything is selected.
    current: Option<SelectionRecord<E, S>>,
    /// Records reachable with Back (most recent last)
    previous: Vec<SelectionRecord<E, S>>,
    /// Records reachable with Forward (most recent last)
    next: Vec<SelectionRecord<E, S>>,
    max_depth: usize,
}

impl<E: Clone, S: Clone> Default for HistoryStore<E, S> {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl<E: Clone, S: Clone> HistoryStore<E, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            current: None,
            previous: Vec::new(),
            next: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Rebuild a store from persisted parts, trimming `previous` to the depth cap.
    pub fn from_parts(
        current: Option<SelectionRecord<E, S>>,
        previous: Vec<SelectionRecord<E, S>>,
        next: Vec<SelectionRecord<E, S>>,
        max_depth: usize,
    ) -> Self {
        let mut store = Self {
            current,
            previous,
            next,
            max_depth: max_depth.max(1),
        };
        store.trim_previous();
        store
    }

    /// Commit a new organic selection.
    ///
    /// The record being replaced moves onto the back stack and the forward stack is
    /// discarded, since the new selection starts a new branch.
    pub fn commit(&mut self, record: Option<SelectionRecord<E, S>>) {
        if self.current.is_none() && record.is_none() {
            return;
        }

        if let Some(current) = self.current.take() {
            self.push_previous(current);
        }
        self.current = record;
        self.next.clear();
    }

    pub fn can_go_back(&self) -> bool {
        !self.previous.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.next.is_empty()
    }

    /// Step back, returning the record that is now current.
    pub fn go_back(&mut self) -> Result<SelectionRecord<E, S>, NavigationError> {
        let record = self.previous.pop().ok_or(NavigationError::EmptyHistory)?;
        if let Some(current) = self.current.take() {
            self.next.push(current);
        }
        self.current = Some(record.clone());
        Ok(record)
    }

    /// Step forward, returning the record that is now current.
    pub fn go_forward(&mut self) -> Result<SelectionRecord<E, S>, NavigationError> {
        let record = self.next.pop().ok_or(NavigationError::EmptyHistory)?;
        if let Some(current) = self.current.take() {
            self.push_previous(current);
        }
        self.current = Some(record.clone());
        Ok(record)
    }

    /// Replace the target of the current record with the reference a restore actually
    /// selected. The path and context are kept for later fallbacks.
    pub fn refresh_current_target(&mut self, target: Option<E>) {
        if let Some(current) = self.current.as_mut() {
            current.target = target;
        }
    }

    pub fn current(&self) -> Option<&SelectionRecord<E, S>> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> &[SelectionRecord<E, S>] {
        &self.previous
    }

    pub fn next(&self) -> &[SelectionRecord<E, S>] {
        &self.next
    }

    /// Forget both stacks, keeping the current selection.
    pub fn clear(&mut self) {
        self.previous.clear();
        self.next.clear();
    }

    fn push_previous(&mut self, record: SelectionRecord<E, S>) {
        self.previous.push(record);
        self.trim_previous();
    }

    fn trim_previous(&mut self) {
        if self.previous.len() > self.max_depth {
            let excess = self.previous.len() - self.max_depth;
            self.previous.drain(..excess);
        }
    }
}
