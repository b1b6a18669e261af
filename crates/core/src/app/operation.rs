use crate::domain::RefreshType;
use crate::error::OperationError;

/// How an operation reports its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub refresh_type: RefreshType,
    /// Publish the refresh even when the operation fails
    pub refresh_even_if_crashes: bool,
    /// Report failures to the error sink
    pub show_error: bool,
}

impl RefreshPolicy {
    pub fn new(refresh_type: RefreshType) -> Self {
        Self {
            refresh_type,
            refresh_even_if_crashes: false,
            show_error: true,
        }
    }

    /// Policy for read-only loads: no refresh
    pub fn none() -> Self {
        Self::new(RefreshType::None)
    }

    pub fn refresh_even_if_crashes(mut self) -> Self {
        self.refresh_even_if_crashes = true;
        self
    }

    /// Do not report failures
    pub fn silent(mut self) -> Self {
        self.show_error = false;
        self
    }

    /// The category to publish for a finished operation, if any
    pub fn refresh_for(&self, failed: bool) -> Option<RefreshType> {
        let publish = self.refresh_type.is_publishable() && (!failed || self.refresh_even_if_crashes);
        publish.then_some(self.refresh_type)
    }
}

/// Final state of a coordinated operation
#[derive(Debug)]
pub enum OperationOutcome<T> {
    Succeeded(T),
    Failed(OperationError),
    Cancelled,
}

impl<T> OperationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, OperationOutcome::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationOutcome::Cancelled)
    }

    pub fn value(self) -> Option<T> {
        match self {
            OperationOutcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&OperationError> {
        match self {
            OperationOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}
