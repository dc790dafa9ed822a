use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    #[error("Profile store is not loaded")]
    NotReady,

    #[error("No response received within {0:?}")]
    Timeout(Duration),

    #[error("Profile dispatcher is not running")]
    Disconnected,

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<std::io::Error> for ProfileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ProfileError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
