//! Error types for the pixel-clear crate.

use crate::workspace::AppPhase;

/// Errors that can occur while ingesting, editing or remotely processing images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No API credential was configured for the remote edit service.
    #[error("missing API key: set GEMINI_API_KEY (or API_KEY) before processing images")]
    MissingCredential,

    /// The HTTP request to the remote edit service could not be completed.
    #[error("request to edit service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote edit service answered with a non-success status.
    #[error("edit service returned {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body or error message from the service.
        message: String,
    },

    /// The service response could not be parsed.
    #[error("malformed service response: {0}")]
    MalformedResponse(String),

    /// An inline image payload was not valid base64.
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A file declared as an image could not be read as one.
    #[error("cannot read image {name}: {source}")]
    Decode {
        /// File name as supplied by the user.
        name: String,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// No record with the given id exists in the current batch.
    #[error("unknown image id: {0}")]
    UnknownImage(String),

    /// The record cannot be refined in its current state.
    #[error("image {id} is not ready for refinement")]
    NotRefinable {
        /// Record id.
        id: String,
    },

    /// A workspace operation was attempted from a phase that does not allow it.
    #[error("invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Phase the workspace was in.
        from: AppPhase,
        /// Phase the operation would have entered.
        to: AppPhase,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stroke data could not be parsed.
    #[error("invalid stroke data: {0}")]
    Strokes(#[from] serde_json::Error),

    /// An error occurred during image processing (decode, resize, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Whether this error is a configuration problem rather than a processing failure.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential)
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
