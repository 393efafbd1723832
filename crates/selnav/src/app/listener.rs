//! Echo filtering for selection-changed notifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// When a pending restore stops suppressing notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuppressionPolicy {
    /// The very next notification is treated as the echo, whatever it carries.
    #[default]
    NextChange,
    /// Only a notification carrying the restored selection is treated as the echo.
    ExpectedValue,
}

impl SuppressionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionPolicy::NextChange => "next-change",
            SuppressionPolicy::ExpectedValue => "expected-value",
        }
    }
}

impl fmt::Display for SuppressionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuppressionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "next-change" | "next" => Ok(SuppressionPolicy::NextChange),
            "expected-value" | "expected" => Ok(SuppressionPolicy::ExpectedValue),
            other => Err(format!("unknown suppression policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerState<E> {
    Armed,
    /// A programmatic assignment of `expected` is in flight.
    Suppressed { expected: Option<E> },
}

/// What a notification turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Organic,
    Echo,
}

/// Two-state machine separating organic changes from restore echoes.
#[derive(Debug, Clone)]
pub struct ChangeListener<E> {
    state: ListenerState<E>,
    policy: SuppressionPolicy,
}

impl<E: PartialEq + fmt::Debug> Default for ChangeListener<E> {
    fn default() -> Self {
        Self::new(SuppressionPolicy::default())
    }
}

impl<E: PartialEq + fmt::Debug> ChangeListener<E> {
    pub fn new(policy: SuppressionPolicy) -> Self {
        Self {
            state: ListenerState::Armed,
            policy,
        }
    }

    /// Expect the echo of a programmatic assignment of `expected`.
    pub fn suppress(&mut self, expected: Option<E>) {
        tracing::trace!(?expected, "suppressing next selection change");
        self.state = ListenerState::Suppressed { expected };
    }

    /// Classify a notification carrying `current`, updating the state.
    pub fn observe(&mut self, current: Option<&E>) -> ChangeKind {
        let ListenerState::Suppressed { expected } = &self.state else {
            return ChangeKind::Organic;
        };

        let is_echo = match self.policy {
            SuppressionPolicy::NextChange => true,
            SuppressionPolicy::ExpectedValue => expected.as_ref() == current,
        };

        if is_echo {
            self.state = ListenerState::Armed;
            ChangeKind::Echo
        } else {
            tracing::debug!(?expected, ?current, "change arrived ahead of restore echo");
            ChangeKind::Organic
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self.state, ListenerState::Suppressed { .. })
    }

    pub fn state(&self) -> &ListenerState<E> {
        &self.state
    }
}
