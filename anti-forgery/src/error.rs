//! Error types and error handling

use thiserror::Error;

/// Anti-forgery filter error type
///
/// Token validation failures are not errors: they produce a denial response.
#[derive(Debug, Error)]
pub enum AntiForgeryError {
    /// Both a static error response and an error handler were configured
    #[error("Configuration error: error_response and error_handler are mutually exclusive")]
    ConflictingDenialOptions,

    /// Malformed `application/x-www-form-urlencoded` body
    #[error("Malformed form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// Malformed `multipart/form-data` body
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),
}

/// Result alias for fallible filter operations
pub type Result<T, E = AntiForgeryError> = std::result::Result<T, E>;
