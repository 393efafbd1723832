//! Domain models for selection records and entity paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const SEPARATOR: char = '/';

/// Hierarchical name-path from a context root down to an entity, root first.
///
/// Persisted as a list of segments so names containing `/` or surrounding spaces
/// survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityPath {
    segments: Vec<String>,
}

impl EntityPath {
    /// Path with no segments, used when nothing is selected.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for EntityPath {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }
        Ok(Self::from_segments(trimmed.split(SEPARATOR)))
    }
}

/// Snapshot of one historical selection.
///
/// `target` is a direct reference that may go stale once the context owning it is
/// closed or reloaded; `path` is kept so the entity can be located again under a fresh
/// context root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize, S: Serialize",
    deserialize = "E: Deserialize<'de>, S: Deserialize<'de>"
))]
pub struct SelectionRecord<E, S> {
    pub target: Option<E>,
    pub path: EntityPath,
    pub context_source: Option<S>,
    pub context_open: bool,
}

impl<E, S> SelectionRecord<E, S> {
    /// Whether the record claims a nested context was open without knowing which one.
    pub fn has_unknown_context(&self) -> bool {
        self.context_open && self.context_source.is_none()
    }
}

impl<E, S: fmt::Display> fmt::Display for SelectionRecord<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str("<unnamed>")?;
        } else {
            write!(f, "{}", self.path)?;
        }
        match (&self.context_source, self.context_open) {
            (Some(source), true) => write!(f, " [{source}]"),
            (None, true) => f.write_str(" [unknown context]"),
            (Some(source), false) => write!(f, " ({source})"),
            (None, false) => Ok(()),
        }
    }
}
