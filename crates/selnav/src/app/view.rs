//! Read-only rendering of the history stacks.

use std::fmt;

use crate::app::store::HistoryStore;
use crate::domain::model::SelectionRecord;

/// Copy of the history taken for inspection.
///
/// `previous` is oldest first and `next` nearest first, so the entries read in the order
/// they were visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryView<E, S> {
    pub previous: Vec<SelectionRecord<E, S>>,
    pub current: Option<SelectionRecord<E, S>>,
    pub next: Vec<SelectionRecord<E, S>>,
}

impl<E: Clone, S: Clone> HistoryView<E, S> {
    pub fn from_store(store: &HistoryStore<E, S>) -> Self {
        Self {
            previous: store.previous().to_vec(),
            current: store.current().cloned(),
            next: store.next().iter().rev().cloned().collect(),
        }
    }
}

impl<E, S: fmt::Display> fmt::Display for HistoryView<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "back ({}):", self.previous.len())?;
        write_entries(f, &self.previous)?;
        match &self.current {
            Some(record) => writeln!(f, "current: {record}")?,
            None => writeln!(f, "current: (nothing)")?,
        }
        writeln!(f, "forward ({}):", self.next.len())?;
        write_entries(f, &self.next)
    }
}

fn write_entries<E, S: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    records: &[SelectionRecord<E, S>],
) -> fmt::Result {
    if records.is_empty() {
        return writeln!(f, "  (empty)");
    }
    for record in records {
        writeln!(f, "  {record}")?;
    }
    Ok(())
}
