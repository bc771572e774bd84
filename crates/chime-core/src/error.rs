use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChimeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChimeError {
    /// Short error code string carried in HTTP response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            ChimeError::Config(_) => "CONFIG_ERROR",
            ChimeError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ChimeError::NotFound(_) => "NOT_FOUND",
            ChimeError::Conflict(_) => "CONFLICT",
            ChimeError::Serialization(_) => "SERIALIZATION_ERROR",
            ChimeError::Io(_) => "IO_ERROR",
            ChimeError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChimeError>;
