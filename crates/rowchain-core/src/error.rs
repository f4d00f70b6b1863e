use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type user-supplied step functions may return.
///
/// Anything implementing `std::error::Error` converts into it with `?`, and
/// plain strings do too (`Err("bad row".into())`).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a user-supplied step function.
pub type StepResult<T = serde_json::Value> = std::result::Result<T, BoxError>;

#[derive(Debug, Error)]
pub enum Error {
    /// Raised while composing a chain, before any data flows.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
