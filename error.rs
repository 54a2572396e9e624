use thiserror::Error;

/// Custom error types for volcrypt operations
#[derive(Debug, Error)]
pub enum VolCryptError {
    /// Key-related errors (loading, generation, validation)
    #[error("Key error: {0}")]
    Key(String),

    /// Invalid invocation or path configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Input stream ended inside a sector; the trailing bytes were not
    /// transformed or written
    #[error("input is not a multiple of the 512-byte sector size; the last {trailing} bytes were ignored")]
    TruncatedInput { trailing: usize },
}

impl VolCryptError {
    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
