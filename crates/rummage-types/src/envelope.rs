//! The result envelope returned by every operation.

use serde::Serialize;

use crate::status::Status;

/// A status plus, on success, the operation's payload.
///
/// The fields are private so that `data` can only be present when the
/// status is [`Status::Ok`]. The converse does not hold: an `Ok` envelope
/// may carry no payload (directory creation, removal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    status: Status,
    data: Option<T>,
}

impl<T> Envelope<T> {
    /// A successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: Status::Ok,
            data: Some(data),
        }
    }

    /// A successful envelope without a payload.
    pub fn done() -> Self {
        Self {
            status: Status::Ok,
            data: None,
        }
    }

    /// The in-flight sentinel returned by callback-form calls.
    pub fn pending() -> Self {
        Self::status(Status::Pending)
    }

    /// An envelope carrying only a status.
    pub fn status(status: Status) -> Self {
        Self { status, data: None }
    }

    pub fn status_code(&self) -> Status {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Split into status and payload.
    pub fn into_parts(self) -> (Status, Option<T>) {
        (self.status, self.data)
    }

    /// Transform the payload, keeping the status.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            status: self.status,
            data: self.data.map(f),
        }
    }

    /// Chain a fallible step that itself reports a status.
    ///
    /// Non-`Ok` envelopes pass through untouched; an `Ok` envelope without
    /// data is handed to `f` as `None`.
    pub fn and_then<U>(self, f: impl FnOnce(Option<T>) -> Envelope<U>) -> Envelope<U> {
        if self.status.is_ok() {
            f(self.data)
        } else {
            Envelope::status(self.status)
        }
    }
}

impl<T> From<Status> for Envelope<T> {
    fn from(status: Status) -> Self {
        Envelope::status(status)
    }
}

impl<T> From<Result<T, Status>> for Envelope<T> {
    fn from(result: Result<T, Status>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(status) => Envelope::status(status),
        }
    }
}
