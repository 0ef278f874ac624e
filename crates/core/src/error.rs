//! Error types for reviewlens operations.
//!
//! The pipeline distinguishes failures by the stage that produced them:
//! [`FetchError`] for page retrieval, [`ModelError`] for the language model
//! backend, and [`ReviewLensError::JsonValidation`] once the bounded reformat
//! loop gives up. All of them are folded into [`ReviewLensError`].
//!
//! # Example
//!
//! ```rust
//! use reviewlens_core::{FetchError, ReviewLensError};
//!
//! let err = ReviewLensError::from(FetchError::InvalidUrl("nope".into()));
//! assert!(err.is_per_url());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while retrieving a page.
///
/// Never retried. The batch runner logs them and moves on to the next URL.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Navigation did not finish within the configured timeout.
    #[error("Navigation timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// HTTP request errors from reqwest.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Browser launch, navigation or DOM read failure.
    #[error("Browser error: {0}")]
    Browser(String),
}

/// Errors raised by the language model backend.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Transport level failure (DNS, TLS, connection reset).
    #[error("Model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the call (auth, quota, bad request).
    #[error("Model backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The call exceeded the configured timeout.
    #[error("Model request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// A response arrived but carried no text (blocked prompt, no candidates).
    #[error("Model returned no text: {0}")]
    EmptyResponse(String),

    /// A success status whose body is not a `generateContent` response.
    #[error("Model response could not be decoded: {0}")]
    MalformedResponse(String),
}

/// Main error type for the extraction pipeline.
#[derive(Error, Debug)]
pub enum ReviewLensError {
    /// Page retrieval failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The language model call failed outside the reformat loop.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Model output never became valid JSON within the attempt budget.
    #[error("Failed to generate valid JSON after {attempts} attempts: {last_error}")]
    JsonValidation { attempts: u32, last_error: String },

    /// Valid JSON that does not have the extraction report shape.
    #[error("Model output does not match the report schema: {0}")]
    SchemaMismatch(String),

    /// Unusable input configuration (missing `url` column, unreadable CSV).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Result file or input file I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result (de)serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReviewLensError {
    /// Whether the error only concerns the URL being processed.
    ///
    /// Per-URL errors are skipped by the batch runner; everything else aborts.
    pub fn is_per_url(&self) -> bool {
        matches!(
            self,
            Self::Fetch(_) | Self::Model(_) | Self::JsonValidation { .. } | Self::SchemaMismatch(_)
        )
    }
}

/// Result type alias for ReviewLensError.
pub type Result<T> = std::result::Result<T, ReviewLensError>;
