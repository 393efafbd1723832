//! Re-establishing a historical selection in the host.

use crate::app::host::{ChangeOf, EditorHost, EntityOf, SourceOf};
use crate::app::listener::ChangeListener;
use crate::app::notify::ChangeFeed;
use crate::app::path;
use crate::domain::errors::NavigationError;
use crate::domain::model::SelectionRecord;

/// Result of applying a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome<E> {
    Selected(E),
    Cleared,
    /// The record could not be applied; the selection was left alone.
    Unchanged,
}

impl<E> RestoreOutcome<E> {
    pub fn selected(&self) -> Option<&E> {
        match self {
            RestoreOutcome::Selected(entity) => Some(entity),
            _ => None,
        }
    }
}

/// Applies one record to the host, entering the listener's suppressed state right
/// before the selection is assigned.
pub struct RecordRestorer<'a, H: EditorHost> {
    host: &'a mut H,
    listener: &'a mut ChangeListener<EntityOf<H>>,
    feed: &'a ChangeFeed<ChangeOf<H>>,
}

impl<'a, H: EditorHost> RecordRestorer<'a, H> {
    pub fn new(
        host: &'a mut H,
        listener: &'a mut ChangeListener<EntityOf<H>>,
        feed: &'a ChangeFeed<ChangeOf<H>>,
    ) -> Self {
        Self {
            host,
            listener,
            feed,
        }
    }

    /// Restore `record`. Resolution failures degrade to a cleared or unchanged selection.
    pub fn apply(
        mut self,
        record: &SelectionRecord<EntityOf<H>, SourceOf<H>>,
    ) -> RestoreOutcome<EntityOf<H>> {
        let live_target = record
            .target
            .as_ref()
            .filter(|target| self.host.is_live(target) && self.describes(target, record));
        if let Some(target) = live_target {
            return self.restore_live(target, record);
        }

        if record.context_open {
            let Some(source) = record.context_source.as_ref() else {
                tracing::warn!(
                    path = %record.path,
                    "record has no context source, clearing selection"
                );
                return self.select(None);
            };
            return match self.switch_to(Some(source)) {
                Ok(root) => self.select_by_path(&root, record),
                Err(err) => {
                    tracing::warn!(source = %source, error = %err, "restore skipped");
                    self.leave_unchanged()
                }
            };
        }

        if record.target.is_some() {
            tracing::debug!(path = %record.path, "top-level target is stale, clearing selection");
        }
        self.select(None)
    }

    fn restore_live(
        &mut self,
        target: &EntityOf<H>,
        record: &SelectionRecord<EntityOf<H>, SourceOf<H>>,
    ) -> RestoreOutcome<EntityOf<H>> {
        let wanted = self.host.context_of(target);
        match self.switch_to(wanted.as_ref()) {
            Ok(_) if self.host.is_live(target) => self.select(Some(target.clone())),
            Ok(root) => self.select_by_path(&root, record),
            Err(err) => {
                tracing::warn!(error = %err, "could not reopen context for live target");
                self.leave_unchanged()
            }
        }
    }

    /// Whether a live `target` is still the entity `record` was captured for. A reference
    /// may be live yet name something else, e.g. an id reused by another document.
    fn describes(
        &self,
        target: &EntityOf<H>,
        record: &SelectionRecord<EntityOf<H>, SourceOf<H>>,
    ) -> bool {
        let root = self.host.context_root_for(target);
        self.host.context_of(target) == record.context_source
            && path::path_of(&*self.host, Some(target), root.as_ref()) == record.path
    }

    /// Close contexts until `wanted` is innermost (or the top level is reached), opening
    /// `wanted` when it is not on the stack. Returns the root of the active context.
    ///
    /// Fails without touching the stack when `wanted` is neither innermost nor openable.
    fn switch_to(
        &mut self,
        wanted: Option<&SourceOf<H>>,
    ) -> Result<EntityOf<H>, NavigationError> {
        if let Some(source) = wanted
            && self.host.current_context().as_ref() != Some(source)
            && !self.host.can_open(source)
        {
            return Err(NavigationError::ContextUnopenable {
                source_name: source.to_string(),
            });
        }

        while self.host.current_context().as_ref() != wanted {
            if !self.host.close_context() {
                break;
            }
        }

        match wanted {
            Some(source) if self.host.current_context().as_ref() != Some(source) => {
                tracing::debug!(source = %source, "opening context for restore");
                self.host.open_context(source)
            }
            _ => Ok(self.host.current_root()),
        }
    }

    fn select_by_path(
        &mut self,
        root: &EntityOf<H>,
        record: &SelectionRecord<EntityOf<H>, SourceOf<H>>,
    ) -> RestoreOutcome<EntityOf<H>> {
        if record.path.is_empty() {
            return self.select(None);
        }
        match path::resolve(&*self.host, root, &record.path) {
            Ok(entity) => self.select(Some(entity)),
            Err(err) => {
                tracing::warn!(error = %err, "path no longer resolves, clearing selection");
                self.select(None)
            }
        }
    }

    fn select(&mut self, entity: Option<EntityOf<H>>) -> RestoreOutcome<EntityOf<H>> {
        self.drop_context_switch_changes();
        if self.host.current_selection() != entity {
            self.listener.suppress(entity.clone());
            self.host.set_current_selection(entity.clone());
        }
        match entity {
            Some(entity) => RestoreOutcome::Selected(entity),
            None => RestoreOutcome::Cleared,
        }
    }

    fn leave_unchanged(&mut self) -> RestoreOutcome<EntityOf<H>> {
        self.drop_context_switch_changes();
        RestoreOutcome::Unchanged
    }

    // Changes raised by closing or opening contexts belong to the restore.
    fn drop_context_switch_changes(&self) {
        let dropped = self.feed.discard_pending();
        if dropped > 0 {
            tracing::trace!(dropped, "discarded context-switch notifications");
        }
    }
}
