//! History persistence utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::model::SelectionRecord;

/// Persisted form of a selection history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize, S: Serialize",
    deserialize = "E: Deserialize<'de>, S: Deserialize<'de>"
))]
pub struct HistorySnapshot<E, S> {
    /// RFC 3339 timestamp of when the snapshot was taken.
    #[serde(default)]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub current: Option<SelectionRecord<E, S>>,
    #[serde(default)]
    pub previous: Vec<SelectionRecord<E, S>>,
    #[serde(default)]
    pub next: Vec<SelectionRecord<E, S>>,
    /// Never written as `true`; a restored history always starts armed.
    #[serde(default, serialize_with = "always_false")]
    pub suppress_next_change: bool,
}

impl<E, S> Default for HistorySnapshot<E, S> {
    fn default() -> Self {
        Self {
            saved_at: None,
            current: None,
            previous: Vec::new(),
            next: Vec::new(),
            suppress_next_change: false,
        }
    }
}

fn always_false<S: Serializer>(_: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(false)
}

/// Persists history snapshots as JSON.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `relative` under `root`, as configured by `session.file`.
    pub fn under(root: &Path, relative: impl AsRef<Path>) -> Self {
        Self::new(root.join(relative))
    }

    /// Location of the persisted snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the most recently persisted snapshot.
    pub fn load<E, S>(&self) -> Result<Option<HistorySnapshot<E, S>>>
    where
        E: DeserializeOwned,
        S: DeserializeOwned,
    {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read history file at {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&data)
            .with_context(|| format!("invalid history data in {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    /// Persist the snapshot, creating parent directories as needed.
    pub fn save<E, S>(&self, snapshot: &HistorySnapshot<E, S>) -> Result<()>
    where
        E: Serialize,
        S: Serialize,
    {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create history directory {}", dir.display()))?;
        }

        let data = serde_json::to_string_pretty(snapshot)
            .context("failed to serialize history snapshot")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write history file to {}", self.path.display()))?;
        Ok(())
    }
}
