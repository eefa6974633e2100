use thiserror::Error;
use tonic::{Code, Status};

/// Errors related to communication with the store.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The backend rejected the request itself.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend could not be reached, or gave up on the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("internal storage error: {0}")]
    StorageError(String),
}

impl Error {
    /// Translates a gRPC status returned by the backend.
    ///
    /// `NotFound` is not an error for lookups and yields `None`; every other
    /// code maps to exactly one [Error] variant, with [Error::StorageError]
    /// catching everything not listed.
    pub fn from_status(status: &Status) -> Option<Self> {
        let msg = format!("{}: {}", status.code(), status.message());
        Some(match status.code() {
            Code::NotFound => return None,
            Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
                Error::InvalidRequest(msg)
            }
            Code::Unavailable
            | Code::DeadlineExceeded
            | Code::Cancelled
            | Code::ResourceExhausted
            | Code::Aborted => Error::Unavailable(msg),
            _ => Error::StorageError(msg),
        })
    }
}

impl From<crate::tonic::Error> for Error {
    fn from(value: crate::tonic::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}
