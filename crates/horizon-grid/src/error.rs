//! Error types for the grid.

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors reported by grid construction and the grid's collaborators.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// The binding target is not a table element.
    #[error("grid: expected a table element, found <{tag}>")]
    NotATable { tag: String },

    /// Columns were requested by inference but there is no first row to inspect.
    #[error("grid: no data to infer columns")]
    NoInferableData,

    /// A child-row model was constructed without a usable template.
    #[error("grid: child row '{model}' requires a non-empty template")]
    MissingTemplate { model: String },

    /// An operation that a concrete model must provide was called on the base model.
    #[error("grid: '{operation}' is abstract and must be overridden")]
    AbstractOperation { operation: String },

    /// A value that is neither an object nor an array was used as a row.
    #[error("grid: invalid row: {reason}")]
    InvalidRow { reason: String },

    /// A request hook reported a failure.
    #[error("grid: request failed: {message}")]
    Request { message: String },

    /// The grid has already been disposed.
    #[error("grid: the grid has been disposed")]
    Disposed,

    /// A host collaborator (table plugin, binding host) reported a failure.
    #[error("grid: host error: {message}")]
    Host { message: String },
}

impl GridError {
    /// Create a wrong-element error.
    pub fn not_a_table(tag: impl Into<String>) -> Self {
        Self::NotATable { tag: tag.into() }
    }

    /// Create a missing-template error.
    pub fn missing_template(model: impl Into<String>) -> Self {
        Self::MissingTemplate {
            model: model.into(),
        }
    }

    /// Create an abstract-operation error.
    pub fn abstract_operation(operation: impl Into<String>) -> Self {
        Self::AbstractOperation {
            operation: operation.into(),
        }
    }

    /// Create an invalid-row error.
    pub fn invalid_row(reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            reason: reason.into(),
        }
    }

    /// Create a request error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Create a host error.
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// Returns `true` for usage or configuration errors that are never retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotATable { .. }
                | Self::NoInferableData
                | Self::MissingTemplate { .. }
                | Self::AbstractOperation { .. }
                | Self::InvalidRow { .. }
        )
    }
}
