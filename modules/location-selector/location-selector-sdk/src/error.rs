//! Error types for the location directory API.

use thiserror::Error;

/// Errors that can occur when talking to a location directory.
///
/// The type is `Clone` because a single in-flight fetch is shared by every
/// caller waiting on the same parent location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The requested location does not exist or is not visible to the user.
    #[error("location not found: {location_id}")]
    LocationNotFound {
        /// The location ID that was not found.
        location_id: String,
    },

    /// The backend refused the request for the current user.
    #[error("unauthorized")]
    Unauthorized,

    /// The request did not complete (transport failure, timeout, bad status).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a payload that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DirectoryError {
    /// Returns `true` when retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
