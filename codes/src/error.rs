use thiserror::Error;
use venue_store::StoreError;

#[derive(Debug, Error)]
pub enum CodeError {
    #[error("invalid venue code: {0}")]
    InvalidFormat(String),

    #[error("venue code storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The store answered but its data is unusable; retrying will not help.
    #[error("venue code storage fault: {0}")]
    StorageFault(String),

    #[error("concurrent regeneration still conflicting after {attempts} attempts")]
    ConcurrentRegenerationConflict { attempts: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CodeError {
    /// Whether the admin can simply retry the same action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CodeError::StorageUnavailable(_) | CodeError::ConcurrentRegenerationConflict { .. }
        )
    }
}

impl From<StoreError> for CodeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => CodeError::ConcurrentRegenerationConflict { attempts: 1 },
            e if e.is_transient() => CodeError::StorageUnavailable(e.to_string()),
            e => CodeError::StorageFault(e.to_string()),
        }
    }
}
