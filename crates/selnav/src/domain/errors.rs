//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("no entity named `{segment}` while resolving `{path}`")]
    NotFound { path: String, segment: String },
    #[error("context `{source_name}` could not be opened")]
    ContextUnopenable { source_name: String },
    #[error("no history to navigate to")]
    EmptyHistory,
}
