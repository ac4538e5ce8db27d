//! Errno Translation
//!
//! Maps OS error numbers onto the network error namespace. The table is total for
//! the codes socket calls are documented to return; entries for codes a platform
//! does not define are compiled only where they exist. Anything else is reported as
//! [`NetError::Unknown`] with a warning carrying the OS description.

use entities_socket_events::NetError;
use std::io;
use tracing::warn;

/// Translate an OS error number
///
/// # Arguments
///
/// * `errno` - Raw error number as returned by the OS
///
/// # Returns
///
/// The matching network error; [`NetError::Unknown`] for unrecognized codes
pub fn translate_errno(errno: i32) -> NetError {
    match errno {
        libc::EINTR => NetError::Interrupted,
        libc::EBADF => NetError::BadDescriptor,
        libc::EPERM | libc::EACCES => NetError::AccessDenied,
        libc::EFAULT => NetError::Fault,
        libc::EINVAL => NetError::InvalidArgument,
        libc::EMFILE => NetError::TooManyOpenFiles,
        libc::EINPROGRESS => NetError::InProgress,
        libc::EALREADY => NetError::Already,
        libc::ENOTSOCK => NetError::NotSocket,
        libc::EDESTADDRREQ => NetError::DestinationAddressRequired,
        libc::EMSGSIZE => NetError::MessageSize,
        libc::EPROTOTYPE => NetError::ProtocolType,
        libc::ENOPROTOOPT => NetError::NoProtocolOption,
        libc::EPROTONOSUPPORT => NetError::ProtocolNotSupported,
        libc::ESOCKTNOSUPPORT => NetError::SocketTypeNotSupported,
        libc::EOPNOTSUPP => NetError::OperationNotSupported,
        libc::EPFNOSUPPORT => NetError::ProtocolFamilyNotSupported,
        libc::EAFNOSUPPORT => NetError::AddressFamilyNotSupported,
        libc::EADDRINUSE => NetError::AddressInUse,
        libc::EADDRNOTAVAIL => NetError::AddressNotAvailable,
        libc::ENETDOWN => NetError::NetworkDown,
        libc::ENETUNREACH => NetError::NetworkUnreachable,
        libc::ENETRESET => NetError::NetworkReset,
        libc::ECONNABORTED => NetError::ConnectionAborted,
        libc::EPIPE | libc::ECONNRESET => NetError::ConnectionReset,
        libc::ENOBUFS => NetError::NoBufferSpace,
        libc::EISCONN => NetError::IsConnected,
        libc::ENOTCONN => NetError::NotConnected,
        libc::ESHUTDOWN => NetError::Shutdown,
        libc::ETOOMANYREFS => NetError::TooManyReferences,
        libc::ETIMEDOUT => NetError::TimedOut,
        libc::ECONNREFUSED => NetError::ConnectionRefused,
        libc::ELOOP => NetError::Loop,
        libc::ENAMETOOLONG => NetError::NameTooLong,
        libc::EHOSTDOWN => NetError::HostDown,
        libc::EHOSTUNREACH => NetError::HostUnreachable,
        libc::ENOTEMPTY => NetError::NotEmpty,
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        libc::EPROCLIM => NetError::ProcessLimit,
        libc::EUSERS => NetError::Users,
        libc::EDQUOT => NetError::DiskQuota,
        libc::ESTALE => NetError::Stale,
        libc::EREMOTE => NetError::Remote,
        // EWOULDBLOCK aliases EAGAIN on the platforms this builds for
        code if code == libc::EWOULDBLOCK || code == libc::EAGAIN => NetError::WouldBlock,
        code => {
            warn!(
                errno = code,
                error = %io::Error::from_raw_os_error(code),
                "unknown socket error"
            );
            NetError::Unknown
        }
    }
}

/// Translate an I/O error from a socket call
///
/// Errors that carry no OS error number are reported as [`NetError::Unknown`].
pub fn translate_io_error(error: &io::Error) -> NetError {
    match error.raw_os_error() {
        Some(code) => translate_errno(code),
        None => {
            warn!(%error, "socket error without errno");
            NetError::Unknown
        }
    }
}
