//! Error types for the stegweb library.
//!
//! * [`ValidationError`]: the user's input is incomplete. Raised by the
//!   request builder before any network I/O.
//!
//! * [`StegError`]: anything that ends a workflow invocation, including
//!   local file I/O around the submission.
//!
//! A failed workflow surfaces exactly one user-facing message (see
//! [`crate::pipeline::present::Notifier`]) and no partial result.

use std::path::PathBuf;
use thiserror::Error;

/// Missing or oversized user input, detected before submission.
///
/// The `Display` text is the message shown to the user, so it is stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No carrier file was selected.
    #[error("Please select a carrier file")]
    MissingCarrierFile,

    /// Secret kind is Text but the text is empty.
    #[error("Please enter the text to hide")]
    MissingSecretText,

    /// Secret kind is File but no file was selected.
    #[error("Please select the file to hide")]
    MissingSecretFile,

    /// The assembled upload exceeds the server's request size limit.
    #[error("Upload is {size} bytes, which exceeds the {limit}-byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// All errors that terminate an encode or decode workflow.
#[derive(Debug, Error)]
pub enum StegError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Required input missing; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A payload file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading a payload file failed for another reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request never produced an HTTP response (refused, reset, DNS…).
    #[error("Request to '{endpoint}' failed: {reason}\nIs the server running?")]
    Transport { endpoint: String, reason: String },

    /// No response arrived within the configured timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s\nIncrease --timeout.")]
    Timeout { endpoint: String, secs: u64 },

    /// Another submission is still in flight.
    #[error("Another request is still in progress; wait for it to finish")]
    Busy,

    // ── Server errors ─────────────────────────────────────────────────────
    /// The server reported a failure, or answered with an unrecognised shape.
    #[error("{message}")]
    Server { message: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write a downloaded file.
    #[error("Failed to write downloaded file '{path}': {source}")]
    DownloadWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StegError {
    /// Build a [`StegError::ReadFailed`]-family error from an I/O error,
    /// mapping the common kinds onto their dedicated variants.
    pub(crate) fn from_read(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StegError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => StegError::PermissionDenied { path },
            _ => StegError::ReadFailed { path, source: err },
        }
    }

    /// True when the request was rejected before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, StegError::Validation(_))
    }
}
