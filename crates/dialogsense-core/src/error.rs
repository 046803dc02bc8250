//! Error types for dialogsense

/// Result type alias using dialogsense's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dialogsense operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing config file, missing keys or invalid values
    #[error("configuration error: {0}")]
    Config(String),

    /// Unreadable or malformed dataset
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Local or remote model resolution failures
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Pipeline failures mid-run
    #[error("inference error: {0}")]
    Inference(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new dataset error
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }
}
