//! Error types for notice rendering and serving

use thiserror::Error;

/// Result type alias for notice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing or serving a notice
///
/// Rendering itself never fails: font and logo errors are caught at the
/// provider boundary and replaced by a visual fallback. These variants surface
/// from the helpers underneath and from encoding, saving, and serving.
#[derive(Error, Debug)]
pub enum Error {
    /// A font candidate could not be found or parsed
    #[error("Font loading failed: {0}")]
    FontError(String),

    /// The logo could not be read or decoded
    #[error("Logo unavailable: {0}")]
    LogoError(String),

    /// Network error while fetching a remote asset
    #[error("Network error: {0}")]
    NetworkError(String),

    /// PNG encoding failed
    #[error("Encoding failed: {0}")]
    EncodeError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A request body could not be interpreted
    #[error("Invalid request: {0}")]
    RequestError(String),

    /// A request body arrived in a format that is not understood
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// The HTTP listener could not be started
    #[cfg(feature = "server")]
    #[error("Server error: {0}")]
    ServerError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::EncodeError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::LogoError(err.to_string())
    }
}
