//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::listener::SuppressionPolicy;
use crate::app::store::DEFAULT_MAX_DEPTH;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".selnav/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default)]
    suppression: Option<SuppressionPolicy>,
}

impl HistorySettings {
    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn suppression(&self) -> SuppressionPolicy {
        self.suppression.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    persist: Option<bool>,
    #[serde(default)]
    file: Option<String>,
}

impl SessionSettings {
    fn default_persist() -> bool {
        true
    }

    fn default_file() -> &'static str {
        ".selnav/history.json"
    }

    pub fn persist(&self) -> bool {
        self.persist.unwrap_or_else(Self::default_persist)
    }

    /// Snapshot location, relative to the workspace root.
    pub fn file(&self) -> String {
        self.file
            .clone()
            .unwrap_or_else(|| Self::default_file().to_owned())
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            persist: Some(Self::default_persist()),
            file: Some(Self::default_file().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    tree: Option<bool>,
}

impl LoggingSettings {
    /// `EnvFilter` directives used when `SELNAV_LOG` is unset.
    pub fn filter(&self) -> &str {
        self.filter.as_deref().unwrap_or("info")
    }

    pub fn tree(&self) -> bool {
        self.tree.unwrap_or(false)
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    max_depth: Option<String>,
    suppression: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            max_depth: env::var("SELNAV_MAX_DEPTH").ok(),
            suppression: env::var("SELNAV_SUPPRESSION").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(max_depth: &str, suppression: &str) -> Self {
        Self {
            max_depth: Some(max_depth.to_owned()),
            suppression: Some(suppression.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            history: merge_history(self.history, other.history),
            session: merge_session(self.session, other.session),
            logging: merge_logging(self.logging, other.logging),
        }
    }
}

fn merge_history(base: HistorySettings, overlay: HistorySettings) -> HistorySettings {
    HistorySettings {
        max_depth: overlay.max_depth.or(base.max_depth),
        suppression: overlay.suppression.or(base.suppression),
    }
}

fn merge_session(mut base: SessionSettings, overlay: SessionSettings) -> SessionSettings {
    if let Some(value) = overlay.persist {
        base.persist = Some(value);
    }
    if let Some(value) = overlay.file {
        base.file = Some(value);
    }
    base
}

fn merge_logging(base: LoggingSettings, overlay: LoggingSettings) -> LoggingSettings {
    LoggingSettings {
        filter: overlay.filter.or(base.filter),
        tree: overlay.tree.or(base.tree),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("selnav/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let root = workspace_root()?;
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

/// Nearest directory above the working directory holding `.git`, else the working
/// directory itself.
pub fn workspace_root() -> Result<PathBuf> {
    let cwd = env::current_dir().context("unable to determine working directory")?;
    Ok(find_repo_root(&cwd).unwrap_or(cwd))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(raw) = env.max_depth {
        match raw.trim().parse::<usize>() {
            Ok(depth) if depth > 0 => config.history.max_depth = Some(depth),
            _ => tracing::warn!(value = %raw, "ignoring invalid SELNAV_MAX_DEPTH"),
        }
    }
    if let Some(raw) = env.suppression {
        match raw.parse::<SuppressionPolicy>() {
            Ok(policy) => config.history.suppression = Some(policy),
            Err(err) => tracing::warn!(error = %err, "ignoring invalid SELNAV_SUPPRESSION"),
        }
    }
    config
}
