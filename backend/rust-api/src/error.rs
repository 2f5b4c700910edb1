use thiserror::Error;

pub type ProgressionResult<T> = Result<T, ProgressionError>;

/// Errors surfaced by the progression core.
///
/// Unknown users, challenges and achievements are not errors: callers get
/// `None`, `false` or an empty list back and branch on that.
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// Malformed input rejected before any state is touched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backing repository failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ProgressionError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProgressionError::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        ProgressionError::Storage(message.into())
    }
}
