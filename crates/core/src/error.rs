use thiserror::Error;

/// Errors surfaced by coordinated repository operations
#[derive(Error, Debug)]
pub enum OperationError {
    /// The repository handle failed (I/O, git, object corruption)
    #[error("{source:#}")]
    Repository { source: anyhow::Error },

    /// A repository operation was invoked with no repository attached
    #[error("No repository is attached")]
    NoRepository,

    #[error("Object not found: {id}")]
    NotFound { id: String },

    #[error("Invalid object id: {value:?}")]
    InvalidObjectId { value: String },

    /// The operation body panicked
    #[error("Operation panicked: {message}")]
    Panicked { message: String },

    /// The owning tab was closed while the operation was in flight
    #[error("Operation cancelled")]
    Cancelled,
}

impl OperationError {
    /// Classify an error returned by an operation body.
    ///
    /// Bodies return `anyhow::Error`; when one wraps an `OperationError`
    /// (for example `NotFound` from the repository adapter) that kind is kept.
    pub fn from_body(error: anyhow::Error) -> Self {
        match error.downcast::<OperationError>() {
            Ok(kind) => kind,
            Err(source) => OperationError::Repository { source },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, OperationError>;
