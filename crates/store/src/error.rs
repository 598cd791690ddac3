use thiserror::Error;

/// Errors raised by the settings store. Absence of a record is never an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}")]
    Storage(#[from] std::io::Error),

    #[error("corrupt settings record '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
