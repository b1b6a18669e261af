use gitpane_core::ports::{ErrorRecord, ErrorSink};
use std::sync::Mutex;
use tracing::{error, warn};

/// Collects operation errors until the UI drains them
#[derive(Debug, Default)]
pub struct ErrorsManager {
    errors: Mutex<Vec<ErrorRecord>>,
}

impl ErrorsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending error, oldest first
    pub fn drain(&self) -> Vec<ErrorRecord> {
        match self.errors.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn latest(&self) -> Option<ErrorRecord> {
        self.errors
            .lock()
            .ok()
            .and_then(|errors| errors.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.errors.lock().map(|errors| errors.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for ErrorsManager {
    fn add_error(&self, record: ErrorRecord) {
        error!("Operation failed: {}", record.cause);
        match self.errors.lock() {
            Ok(mut errors) => errors.push(record),
            Err(poisoned) => {
                warn!("Errors lock poisoned, recovering");
                poisoned.into_inner().push(record);
            }
        }
    }
}
