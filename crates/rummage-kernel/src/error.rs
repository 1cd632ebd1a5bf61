//! Error types for the two failure channels.
//!
//! Expected outcomes are [`Status`] codes inside an
//! [`Envelope`](rummage_types::Envelope). Host transport failures are
//! [`FsError`]s. [`Failure`] is what the asynchronous failure channel
//! carries and what blocking/future calls return in `Err`.

use rummage_types::Status;
use thiserror::Error;

/// Host filesystem errors.
#[derive(Debug, Clone, Error)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("is a directory: {0}")]
    IsDirectory(String),
    #[error("not a directory: {0}")]
    NotDirectory(String),
    #[error("read-only filesystem")]
    ReadOnly,
    #[error("io error: {0}")]
    Io(String),
    #[error("executor unavailable: {0}")]
    Runtime(String),
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => FsError::NotFound(err.to_string()),
            ErrorKind::AlreadyExists => FsError::AlreadyExists(err.to_string()),
            ErrorKind::PermissionDenied => FsError::PermissionDenied(err.to_string()),
            ErrorKind::IsADirectory => FsError::IsDirectory(err.to_string()),
            ErrorKind::NotADirectory => FsError::NotDirectory(err.to_string()),
            ErrorKind::ReadOnlyFilesystem => FsError::ReadOnly,
            _ => FsError::Io(err.to_string()),
        }
    }
}

/// Rejection delivered on the failure channel.
///
/// `Status` is an operation-level failure (for example a search branch
/// that found its directory gone); `Io` is a host transport failure. The
/// two never collapse into each other.
#[derive(Debug, Clone, Error)]
pub enum Failure {
    #[error("operation failed: {0}")]
    Status(Status),
    #[error(transparent)]
    Io(#[from] FsError),
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::Io(err.into())
    }
}

impl Failure {
    /// The status code, when this is an operation-level failure.
    pub fn status(&self) -> Option<Status> {
        match self {
            Failure::Status(status) => Some(*status),
            Failure::Io(_) => None,
        }
    }
}

/// Result type of every rummage operation.
pub type OpResult<T> = Result<rummage_types::Envelope<T>, Failure>;
