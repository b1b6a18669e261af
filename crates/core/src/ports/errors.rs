/// User-facing record of a failed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub timestamp_millis: i64,
    /// Short message for the status line
    pub message: String,
    /// Full error chain
    pub cause: String,
}

impl ErrorRecord {
    pub fn new(timestamp_millis: i64, message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            timestamp_millis,
            message: message.into(),
            cause: cause.into(),
        }
    }
}

/// Error-reporting collaborator. Errors accumulate until the UI drains them.
pub trait ErrorSink: Send + Sync {
    fn add_error(&self, error: ErrorRecord);
}
