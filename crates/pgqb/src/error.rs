//! Error types for pgqb

use thiserror::Error;

/// Result type alias for query construction.
pub type QbResult<T> = Result<T, QbError>;

/// Error types for statement construction.
///
/// All of these are programmer errors (malformed call sequences), never
/// environmental failures. An error aborts the current statement; there is
/// no retry or partial render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QbError {
    /// NULL passed where a concrete predicate value is required.
    #[error("Invalid value for column '{0}': NULL cannot be bound as a predicate value")]
    NullValue(String),

    /// Empty list passed to an IN predicate.
    #[error("IN predicate on column '{0}' requires a non-empty list")]
    EmptyInList(String),

    /// Unrecognized sort direction token.
    #[error("Invalid sort direction '{0}' (expected ASC or DESC)")]
    InvalidDirection(String),

    /// INSERT called with an empty row set.
    #[error("No rows provided")]
    NoRows,

    /// `include()` used without any explicitly selected base column.
    #[error("include('{0}') requires at least one explicitly selected column")]
    IncludeWithoutSelect(String),

    /// UPDATE/DELETE rendered without a WHERE clause and without the
    /// unsafe override.
    #[error("Refusing to render {0} without a WHERE clause")]
    MissingWhere(&'static str),

    /// Catch-all for other malformed builder state.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl QbError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
