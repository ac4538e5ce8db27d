//! Network Error Namespace
//!
//! Clients see socket failures as codes in the network error namespace rather than
//! as host errno values. [`NetError`] names every code the multiplexer can report;
//! [`ErrorSlots`] holds the last error recorded for each event kind.

use crate::event_kind::{EventKind, EVENT_ERROR_SLOTS};
use thiserror::Error;

/// Network error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum NetError {
    #[error("interrupted function call")]
    Interrupted,
    #[error("bad file descriptor")]
    BadDescriptor,
    #[error("permission denied")]
    AccessDenied,
    #[error("bad address")]
    Fault,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("resource temporarily unavailable")]
    WouldBlock,
    #[error("operation now in progress")]
    InProgress,
    #[error("operation already in progress")]
    Already,
    #[error("socket operation on non-socket")]
    NotSocket,
    #[error("destination address required")]
    DestinationAddressRequired,
    #[error("message too long")]
    MessageSize,
    #[error("protocol wrong type for socket")]
    ProtocolType,
    #[error("bad protocol option")]
    NoProtocolOption,
    #[error("protocol not supported")]
    ProtocolNotSupported,
    #[error("socket type not supported")]
    SocketTypeNotSupported,
    #[error("operation not supported")]
    OperationNotSupported,
    #[error("protocol family not supported")]
    ProtocolFamilyNotSupported,
    #[error("address family not supported by protocol family")]
    AddressFamilyNotSupported,
    #[error("address already in use")]
    AddressInUse,
    #[error("cannot assign requested address")]
    AddressNotAvailable,
    #[error("network is down")]
    NetworkDown,
    #[error("network is unreachable")]
    NetworkUnreachable,
    #[error("network dropped connection on reset")]
    NetworkReset,
    #[error("software caused connection abort")]
    ConnectionAborted,
    #[error("connection reset by peer")]
    ConnectionReset,
    #[error("no buffer space available")]
    NoBufferSpace,
    #[error("socket is already connected")]
    IsConnected,
    #[error("socket is not connected")]
    NotConnected,
    #[error("cannot send after socket shutdown")]
    Shutdown,
    #[error("too many references")]
    TooManyReferences,
    #[error("connection timed out")]
    TimedOut,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("cannot translate name")]
    Loop,
    #[error("name too long")]
    NameTooLong,
    #[error("host is down")]
    HostDown,
    #[error("no route to host")]
    HostUnreachable,
    #[error("directory not empty")]
    NotEmpty,
    #[error("too many processes")]
    ProcessLimit,
    #[error("user quota exceeded")]
    Users,
    #[error("disk quota exceeded")]
    DiskQuota,
    #[error("stale file handle reference")]
    Stale,
    #[error("item is remote")]
    Remote,
    #[error("unknown error")]
    Unknown,
}

impl NetError {
    /// Numeric code reported to clients
    pub fn code(self) -> u32 {
        match self {
            NetError::Interrupted => 10004,
            NetError::BadDescriptor => 10009,
            NetError::AccessDenied => 10013,
            NetError::Fault => 10014,
            NetError::InvalidArgument => 10022,
            NetError::TooManyOpenFiles => 10024,
            NetError::WouldBlock => 10035,
            NetError::InProgress => 10036,
            NetError::Already => 10037,
            NetError::NotSocket => 10038,
            NetError::DestinationAddressRequired => 10039,
            NetError::MessageSize => 10040,
            NetError::ProtocolType => 10041,
            NetError::NoProtocolOption => 10042,
            NetError::ProtocolNotSupported => 10043,
            NetError::SocketTypeNotSupported => 10044,
            NetError::OperationNotSupported => 10045,
            NetError::ProtocolFamilyNotSupported => 10046,
            NetError::AddressFamilyNotSupported => 10047,
            NetError::AddressInUse => 10048,
            NetError::AddressNotAvailable => 10049,
            NetError::NetworkDown => 10050,
            NetError::NetworkUnreachable => 10051,
            NetError::NetworkReset => 10052,
            NetError::ConnectionAborted => 10053,
            NetError::ConnectionReset => 10054,
            NetError::NoBufferSpace => 10055,
            NetError::IsConnected => 10056,
            NetError::NotConnected => 10057,
            NetError::Shutdown => 10058,
            NetError::TooManyReferences => 10059,
            NetError::TimedOut => 10060,
            NetError::ConnectionRefused => 10061,
            NetError::Loop => 10062,
            NetError::NameTooLong => 10063,
            NetError::HostDown => 10064,
            NetError::HostUnreachable => 10065,
            NetError::NotEmpty => 10066,
            NetError::ProcessLimit => 10067,
            NetError::Users => 10068,
            NetError::DiskQuota => 10069,
            NetError::Stale => 10070,
            NetError::Remote => 10071,
            NetError::Unknown => 99999,
        }
    }
}

/// Last error recorded for each network event kind
///
/// A slot is only meaningful while its kind is pending. `None` means the event
/// completed without error and is reported as code 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorSlots([Option<NetError>; EVENT_ERROR_SLOTS]);

impl ErrorSlots {
    /// Record the outcome of an event; the service monitor kind has no slot
    pub fn set(&mut self, kind: EventKind, error: Option<NetError>) {
        if let Some(slot) = kind.error_slot() {
            self.0[slot] = error;
        }
    }

    /// Last error recorded for `kind`
    pub fn get(&self, kind: EventKind) -> Option<NetError> {
        kind.error_slot().and_then(|slot| self.0[slot])
    }

    /// All slots as wire codes
    pub fn codes(&self) -> [u32; EVENT_ERROR_SLOTS] {
        self.0.map(|error| error.map_or(0, NetError::code))
    }

    /// Wire codes truncated to the caller's capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of entries the caller can receive
    pub fn truncated(&self, capacity: usize) -> Vec<u32> {
        let codes = self.codes();
        codes[..capacity.min(EVENT_ERROR_SLOTS)].to_vec()
    }
}
