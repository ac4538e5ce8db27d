//! Socket Module
//!
//! [`NativeSocket`] is the descriptor behind every socket record. It is always
//! non-blocking and every call returns immediately: accept, the one-byte peek used to
//! detect a half-closed peer, the `SO_ERROR` read and the zero-timeout readiness probe.

use crate::errno::translate_io_error;
use adapters_check_io::probe_readiness;
use entities_socket_events::{NetError, PollInterest, Readiness};
use socket2::{Domain, Protocol, Socket as Socket2, Type};
use std::mem::MaybeUninit;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::debug;
use usecases_socket_events::SocketDescriptor;

/// Non-blocking OS socket
pub struct NativeSocket {
    inner: Socket2,
    connectionless: bool,
}

impl NativeSocket {
    /// Open a new socket
    ///
    /// # Arguments
    ///
    /// * `family` - Address family (`AF_INET`, `AF_INET6`, ...)
    /// * `ty` - Socket type (`SOCK_STREAM`, `SOCK_DGRAM`, ...)
    /// * `protocol` - Protocol number, `0` for the family's default
    ///
    /// # Returns
    ///
    /// * `Ok(NativeSocket)` - Open, non-blocking socket
    /// * `Err(NetError)` - The OS refused the socket
    pub fn open(family: i32, ty: i32, protocol: i32) -> Result<Self, NetError> {
        let protocol = (protocol != 0).then(|| Protocol::from(protocol));
        let socket = Socket2::new(Domain::from(family), Type::from(ty), protocol)
            .map_err(|e| translate_io_error(&e))?;
        debug!(family, ty, fd = socket.as_raw_fd(), "opened socket");
        Self::wrap(socket, ty != libc::SOCK_STREAM)
    }

    fn wrap(socket: Socket2, connectionless: bool) -> Result<Self, NetError> {
        socket
            .set_nonblocking(true)
            .map_err(|e| translate_io_error(&e))?;
        Ok(Self {
            inner: socket,
            connectionless,
        })
    }

    /// `true` for anything but stream sockets
    pub fn is_connectionless(&self) -> bool {
        self.connectionless
    }

    /// The underlying `socket2` socket, for bind / listen / connect
    pub fn inner(&self) -> &Socket2 {
        &self.inner
    }
}

impl SocketDescriptor for NativeSocket {
    fn raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }

    fn peek_end_of_stream(&self) -> bool {
        let mut byte = [MaybeUninit::<u8>::uninit(); 1];
        matches!(self.inner.peek(&mut byte), Ok(0))
    }

    fn take_error(&self) -> Option<NetError> {
        match self.inner.take_error() {
            Ok(pending) => pending.as_ref().map(translate_io_error),
            Err(error) => Some(translate_io_error(&error)),
        }
    }

    fn probe(&self, interest: PollInterest) -> Readiness {
        probe_readiness(&self.inner, interest)
    }

    fn accept(&self) -> Result<Self, NetError> {
        let (socket, _peer) = self.inner.accept().map_err(|e| translate_io_error(&e))?;
        Self::wrap(socket, false)
    }
}
