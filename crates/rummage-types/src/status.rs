//! The closed status vocabulary.
//!
//! Every operation in rummage reports exactly one of these codes. Expected
//! outcomes (missing paths, refused mutations, codec failures) travel as a
//! `Status`; unexpected host I/O failures never do.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome code carried by every [`Envelope`](crate::Envelope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The operation completed.
    Ok,
    /// The operation is in flight; the result arrives through a callback.
    Pending,
    /// The host trust level does not allow this operation.
    NotPermitted,
    /// The target path does not exist.
    PathNotFound,
    /// The target path is already taken.
    AlreadyExists,
    /// The directory still has children.
    NotEmpty,
    /// A callback-form call was made without a success callback.
    MissingCallback,
    /// No options object was supplied.
    MissingOptions,
    /// The target exists and the caller did not allow overwriting it.
    OverwriteNotPermitted,
    /// The decompress stage rejected the payload.
    DecodeFailed,
    /// The parse stage rejected the payload.
    ParseFailed,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Status; 11] = [
        Status::Ok,
        Status::Pending,
        Status::NotPermitted,
        Status::PathNotFound,
        Status::AlreadyExists,
        Status::NotEmpty,
        Status::MissingCallback,
        Status::MissingOptions,
        Status::OverwriteNotPermitted,
        Status::DecodeFailed,
        Status::ParseFailed,
    ];

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }

    /// Wire name of the status, as it appears in serialized envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Pending => "PENDING",
            Status::NotPermitted => "NOT_PERMITTED",
            Status::PathNotFound => "PATH_NOT_FOUND",
            Status::AlreadyExists => "ALREADY_EXISTS",
            Status::NotEmpty => "NOT_EMPTY",
            Status::MissingCallback => "MISSING_CALLBACK",
            Status::MissingOptions => "MISSING_OPTIONS",
            Status::OverwriteNotPermitted => "OVERWRITE_NOT_PERMITTED",
            Status::DecodeFailed => "DECODE_FAILED",
            Status::ParseFailed => "PARSE_FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
