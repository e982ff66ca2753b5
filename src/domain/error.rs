//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::DocumentId;

/// Domain errors represent requests the document forest cannot satisfy.
/// Malformed input never ends up here: it degrades to a safe default instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),

    #[error("drag offset must be finite, got ({dx}, {dy})")]
    NonFiniteOffset { dx: f64, dy: f64 },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
