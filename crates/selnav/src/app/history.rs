//! Selection history session.
//!
//! A [`SelectionHistory`] is created once per editing session and owns everything the
//! Back/Forward commands need: the history stacks, the echo filter and the host
//! subscription. Hosts deliver selection changes through the subscription, each with
//! its record already captured; the session drains them with
//! [`SelectionHistory::pump`], which callers run from their event loop (navigation
//! commands pump before acting as well). Draining late or in batches records the same
//! history as draining after every change.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::app::host::{ChangeOf, EditorHost, EntityOf, SourceOf};
use crate::app::listener::{ChangeKind, ChangeListener, SuppressionPolicy};
use crate::app::notify::{ChangeFeed, SelectionChange};
use crate::app::restore::{RecordRestorer, RestoreOutcome};
use crate::app::session::HistorySnapshot;
use crate::app::store::{DEFAULT_MAX_DEPTH, HistoryStore};
use crate::app::view::HistoryView;
use crate::infra::config::Config;

/// Tuning for a history session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    pub max_depth: usize,
    pub suppression: SuppressionPolicy,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            suppression: SuppressionPolicy::default(),
        }
    }
}

impl HistoryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_depth: config.history.max_depth(),
            suppression: config.history.suppression(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Back,
    Forward,
}

/// Back/Forward navigation over the host's selection.
pub struct SelectionHistory<H: EditorHost> {
    store: HistoryStore<EntityOf<H>, SourceOf<H>>,
    listener: ChangeListener<EntityOf<H>>,
    feed: ChangeFeed<ChangeOf<H>>,
}

impl<H: EditorHost> SelectionHistory<H> {
    /// Subscribe to `host` and start with its current selection and empty stacks.
    pub fn attach(host: &mut H, options: &HistoryOptions) -> Self {
        let feed = host.subscribe_selection_changed();
        let mut store = HistoryStore::with_max_depth(options.max_depth);
        let current = host.current_selection();
        store.commit(SelectionChange::capture(&*host, current.as_ref()).record);

        Self {
            store,
            listener: ChangeListener::new(options.suppression),
            feed,
        }
    }

    /// Subscribe to `host` and continue a persisted history.
    pub fn from_snapshot(
        host: &mut H,
        snapshot: HistorySnapshot<EntityOf<H>, SourceOf<H>>,
        options: &HistoryOptions,
    ) -> Self {
        let feed = host.subscribe_selection_changed();
        let store = HistoryStore::from_parts(
            snapshot.current,
            snapshot.previous,
            snapshot.next,
            options.max_depth,
        );

        Self {
            store,
            listener: ChangeListener::new(options.suppression),
            feed,
        }
    }

    /// Process every queued selection change. Returns how many were committed.
    pub fn pump(&mut self) -> usize {
        let mut committed = 0;
        while let Some(change) = self.feed.next_change() {
            if self.handle_selection_changed(change) {
                committed += 1;
            }
        }
        committed
    }

    /// Handle one selection-changed notification.
    ///
    /// Returns `true` when the change was organic and committed to history.
    pub fn handle_selection_changed(&mut self, change: ChangeOf<H>) -> bool {
        match self.listener.observe(change.selected.as_ref()) {
            ChangeKind::Echo => {
                tracing::trace!(selected = ?change.selected, "ignoring restore echo");
                false
            }
            ChangeKind::Organic => {
                if let Some(record) = &change.record {
                    tracing::debug!(path = %record.path, "selection committed");
                }
                self.store.commit(change.record);
                true
            }
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.store.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.store.can_go_forward()
    }

    /// Step back one selection. Returns `false` when there is nothing to go back to.
    pub fn back(&mut self, host: &mut H) -> bool {
        self.navigate(host, Direction::Back)
    }

    /// Step forward one selection. Returns `false` when there is nothing ahead.
    pub fn forward(&mut self, host: &mut H) -> bool {
        self.navigate(host, Direction::Forward)
    }

    fn navigate(&mut self, host: &mut H, direction: Direction) -> bool {
        self.pump();

        let step = match direction {
            Direction::Back if self.can_go_back() => self.store.go_back(),
            Direction::Forward if self.can_go_forward() => self.store.go_forward(),
            _ => return false,
        };
        let record = match step {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(error = %err, ?direction, "navigation ignored");
                return false;
            }
        };

        let outcome = RecordRestorer::new(host, &mut self.listener, &self.feed).apply(&record);
        if outcome == RestoreOutcome::Unchanged {
            tracing::warn!(path = %record.path, ?direction, "selection left unchanged");
        }
        self.store.refresh_current_target(outcome.selected().cloned());
        true
    }

    /// Select the host's history inspector (if it has one) without recording it, and
    /// return a copy of the history for display.
    pub fn view_history(&mut self, host: &mut H) -> HistoryView<EntityOf<H>, SourceOf<H>> {
        self.pump();

        if let Some(inspector) = host.history_inspector()
            && host.current_selection().as_ref() != Some(&inspector)
        {
            self.listener.suppress(Some(inspector.clone()));
            host.set_current_selection(Some(inspector));
        }

        HistoryView::from_store(&self.store)
    }

    /// Persistable copy of the history. The suppression state is never carried over.
    pub fn snapshot(&self) -> HistorySnapshot<EntityOf<H>, SourceOf<H>> {
        HistorySnapshot {
            saved_at: OffsetDateTime::now_utc().format(&Rfc3339).ok(),
            current: self.store.current().cloned(),
            previous: self.store.previous().to_vec(),
            next: self.store.next().to_vec(),
            suppress_next_change: false,
        }
    }

    /// Forget both stacks, keeping the current selection.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn store(&self) -> &HistoryStore<EntityOf<H>, SourceOf<H>> {
        &self.store
    }

    pub fn listener(&self) -> &ChangeListener<EntityOf<H>> {
        &self.listener
    }
}
