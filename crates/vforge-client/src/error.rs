//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx API response. The status code is kept in the message so
    /// that retry patterns such as "429" or "503" can match on it.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Generation failed: {0}")]
    RemoteFailed(String),

    #[error("Timed out waiting for completion after {attempts} poll attempts")]
    PollExhausted { attempts: u32 },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }
}
