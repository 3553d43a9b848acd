use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogsError {
    #[error("Invalid call type '{0}': use letters, digits, '-' or '_'")]
    InvalidCallType(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LogsError {
    /// Returns true if writing the same entry again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LogsError::InvalidCallType(_) => false,
            LogsError::Serialization(_) => false,
            LogsError::Sink(_) => true,
            LogsError::Config(_) => false,
        }
    }
}
