//! Narrow interfaces the history engine consumes from its host editor.

use std::fmt;

use crate::app::notify::{ChangeFeed, SelectionChange};
use crate::domain::errors::NavigationError;

/// Read-only introspection of the host's entity hierarchy.
pub trait EntityTree {
    type Entity: Clone + Eq + fmt::Debug;

    fn parent_of(&self, entity: &Self::Entity) -> Option<Self::Entity>;

    fn name_of(&self, entity: &Self::Entity) -> String;

    /// First direct child of `entity` carrying `name`.
    fn child_named(&self, entity: &Self::Entity, name: &str) -> Option<Self::Entity>;

    /// Whether the reference still points into the host's live object set.
    fn is_live(&self, entity: &Self::Entity) -> bool;
}

/// Stack of nested editing contexts.
pub trait ContextHost: EntityTree {
    /// Identifies the asset that defines a context.
    type Source: Clone + Eq + fmt::Debug + fmt::Display;

    /// Source of the innermost open context, `None` at top level.
    fn current_context(&self) -> Option<Self::Source>;

    /// Whether `open_context(source)` can succeed. Checked before any context is closed.
    fn can_open(&self, source: &Self::Source) -> bool;

    /// Open `source` as the innermost context and return its root entity.
    fn open_context(&mut self, source: &Self::Source) -> Result<Self::Entity, NavigationError>;

    /// Close the innermost context. Returns `false` when already at top level.
    fn close_context(&mut self) -> bool;

    /// Context owning `entity`, `None` for top-level entities.
    fn context_of(&self, entity: &Self::Entity) -> Option<Self::Source>;

    /// Root that paths of `entity` are expressed against.
    fn context_root_for(&self, entity: &Self::Entity) -> Option<Self::Entity>;

    /// Root of the innermost open context, or of the top level.
    fn current_root(&self) -> Self::Entity;
}

/// The host's single "current selection".
pub trait SelectionHost: ContextHost {
    fn current_selection(&self) -> Option<Self::Entity>;

    /// Assign the selection. Hosts notify subscribers only when the value changes, with
    /// a [`SelectionChange`] captured before returning.
    fn set_current_selection(&mut self, entity: Option<Self::Entity>);

    fn subscribe_selection_changed(&mut self) -> ChangeFeed<ChangeOf<Self>>;

    /// Entity representing the history itself, selected by `view_history`.
    fn history_inspector(&self) -> Option<Self::Entity> {
        None
    }
}

/// Everything a selection history session needs from its host.
pub trait EditorHost: SelectionHost {}

impl<T: SelectionHost> EditorHost for T {}

/// Entity type of a host.
pub type EntityOf<H> = <H as EntityTree>::Entity;

/// Context source type of a host.
pub type SourceOf<H> = <H as ContextHost>::Source;

/// Notification payload of a host.
pub type ChangeOf<H> = SelectionChange<EntityOf<H>, SourceOf<H>>;
