//! Error types for `documind-model`.

use thiserror::Error;

/// Errors that can occur when talking to a language-model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No API key was provided and none was found in the environment.
    #[error("API key not set: {0}")]
    MissingApiKey(String),

    /// The HTTP request could not be sent or completed.
    #[error("Request failed: {0}")]
    Request(String),

    /// The backend returned a non-success status.
    #[error("API returned {status}: {message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error detail extracted from the response body.
        message: String,
    },

    /// The response stream broke or produced an undecodable event.
    #[error("Stream error: {0}")]
    Stream(String),
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
