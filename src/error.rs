//! Error types for the media session
//!
//! Every variant is recovered locally: none of them tear a side down.

use crate::kinds::{DeviceKind, MediaKind, Side};
use thiserror::Error;

/// Errors produced by side session transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} acquisition already in flight for {side} side")]
    AcquisitionInFlight { side: Side, kind: DeviceKind },
}

/// Upload rejections, worded for display to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please upload a valid {media} file")]
    UnsupportedFormat { media: MediaKind, content_type: String },

    #[error("File size should be less than {max_size_mb}MB")]
    TooLarge { max_size_mb: u64, size_bytes: u64 },
}

pub type SessionResult<T> = Result<T, SessionError>;
