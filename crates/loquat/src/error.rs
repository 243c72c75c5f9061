//! Error types for loquat

use thiserror::Error;

/// Result type alias for loquat operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Error types for query construction, compilation and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// A criteria setter received a value that violates its contract
    /// (blank/empty value, bare `%` wildcard, empty IN list, too few
    /// grouped specs). Raised at the call site, never coerced.
    #[error("Construction error on '{field}': {message}")]
    Construction { field: String, message: String },

    /// A template failed to compile: malformed placeholder expression or
    /// unresolvable template variable.
    #[error("Template error in '{template}': {message}")]
    Template { template: String, message: String },

    /// Registering a template or query under an already-taken name.
    #[error("Duplicate registration: {0}")]
    DuplicateName(String),

    /// Looking up a query id that was never registered.
    #[error("Unknown query id: {0}")]
    UnknownQuery(String),

    /// Identifier or general input validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anything the execution gateway reports, passed through unmodified.
    #[error("Gateway error: {0}")]
    Gateway(#[from] tokio_postgres::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Create a construction error for a specific field.
    pub fn construction(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a template compile error naming the offending template.
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a construction error
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction { .. })
    }

    /// Check if this is a duplicate-name error
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, Self::DuplicateName(_))
    }
}
