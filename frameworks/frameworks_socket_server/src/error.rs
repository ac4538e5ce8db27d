//! Server Errors
//!
//! Everything a request can fail with. Network errors keep their own code; handle
//! and access failures use the server's status codes.

use entities_socket_events::{NetError, StateError};
use thiserror::Error;

const STATUS_INVALID_HANDLE: u32 = 0xC000_0008;
const STATUS_ACCESS_DENIED: u32 = 0xC000_0022;
const STATUS_OBJECT_TYPE_MISMATCH: u32 = 0xC000_0024;

/// Request failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The handle is not open in the table
    #[error("invalid handle {0:#x}")]
    InvalidHandle(u32),
    /// The handle lacks the access rights the request needs
    #[error("access denied")]
    AccessDenied,
    /// The handle refers to another kind of object
    #[error("object type mismatch")]
    ObjectTypeMismatch,
    /// Network error, reported as-is
    #[error(transparent)]
    Net(#[from] NetError),
}

impl ServerError {
    /// Last-error code reported to the client
    pub fn code(&self) -> u32 {
        match self {
            ServerError::InvalidHandle(_) => STATUS_INVALID_HANDLE,
            ServerError::AccessDenied => STATUS_ACCESS_DENIED,
            ServerError::ObjectTypeMismatch => STATUS_OBJECT_TYPE_MISMATCH,
            ServerError::Net(error) => error.code(),
        }
    }
}

impl From<StateError> for ServerError {
    fn from(_: StateError) -> Self {
        ServerError::Net(NetError::InvalidArgument)
    }
}
