use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for a managed media fetch
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid {platform} URL: {url}")]
    InvalidUrl { platform: &'static str, url: String },

    #[error("could not resolve media info: {0}")]
    Resolution(String),

    #[error("requested format is not available: {0}")]
    FormatUnavailable(String),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("download finished but no file was produced at {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("extraction engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("all {attempts} download attempts failed: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },
}

/// Result type alias for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// Create an invalid URL error
    pub fn invalid_url<S: Into<String>>(platform: &'static str, url: S) -> Self {
        FetchError::InvalidUrl {
            platform,
            url: url.into(),
        }
    }

    /// Create a resolution failure
    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        FetchError::Resolution(msg.into())
    }

    /// Create a format-unavailable error
    pub fn format_unavailable<S: Into<String>>(msg: S) -> Self {
        FetchError::FormatUnavailable(msg.into())
    }

    /// Create a transfer failure
    pub fn transfer<S: Into<String>>(msg: S) -> Self {
        FetchError::Transfer(msg.into())
    }

    /// Create a generic engine error
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        FetchError::Engine(msg.into())
    }

    /// Whether another attempt with the same configuration can succeed.
    /// Invalid URLs and exhaustion are terminal; everything else is worth
    /// a retry (format-unavailable additionally triggers the one fallback
    /// switch when the profile defines one).
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            FetchError::InvalidUrl { .. } | FetchError::Exhausted { .. }
        )
    }
}
