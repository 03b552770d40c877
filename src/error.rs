//! Error types for the snapshot renderer

use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while walking, rendering or exporting a document.
///
/// The type is `Clone` so a single failure can be handed to every callback
/// registered on a [`Completion`](crate::completion::Completion).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An image could not be fetched or decoded
    #[error("Failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },

    /// The raster surface could not be exported
    #[error("Surface export failed: {0}")]
    ExportError(String),

    /// The document snapshot is malformed
    #[error("Invalid document: {0}")]
    DocumentError(String),

    /// A font could not be loaded
    #[error("Font error: {0}")]
    FontError(String),

    /// Network error outside of a single image load
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The task queue drained before an awaited completion finished
    #[error("Rendering stalled: {0}")]
    Stalled(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn image_load(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::ImageLoad {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DocumentError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}
