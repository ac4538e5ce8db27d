//! Server Socket Descriptor
//!
//! [`ServerSocket`] is the descriptor behind every socket record the server holds.
//! Dropping it closes the native socket and leaves the descriptor number on the
//! server's release list. The server drains that list before it registers anything
//! new or sweeps the polling loop, so a closed descriptor never stays watched, whoever
//! dropped the last reference to the record.

use adapters_socket::NativeSocket;
use entities_socket_events::{NetError, PollInterest, Readiness};
use std::cell::RefCell;
use std::os::unix::io::RawFd;
use std::rc::Rc;
use tracing::trace;
use usecases_socket_events::SocketDescriptor;

/// Descriptors closed since the server last unregistered them
pub(crate) type ReleaseList = Rc<RefCell<Vec<RawFd>>>;

/// Native socket owned by a server-side socket record
pub struct ServerSocket {
    native: NativeSocket,
    released: ReleaseList,
}

impl ServerSocket {
    pub(crate) fn new(native: NativeSocket, released: ReleaseList) -> Self {
        Self { native, released }
    }

    /// The native socket, for bind / listen / connect
    pub fn native(&self) -> &NativeSocket {
        &self.native
    }
}

impl SocketDescriptor for ServerSocket {
    fn raw_fd(&self) -> RawFd {
        self.native.raw_fd()
    }

    fn peek_end_of_stream(&self) -> bool {
        self.native.peek_end_of_stream()
    }

    fn take_error(&self) -> Option<NetError> {
        self.native.take_error()
    }

    fn probe(&self, interest: PollInterest) -> Readiness {
        self.native.probe(interest)
    }

    fn accept(&self) -> Result<Self, NetError> {
        let native = self.native.accept()?;
        Ok(Self::new(native, self.released.clone()))
    }
}

impl Drop for ServerSocket {
    fn drop(&mut self) {
        let fd = self.native.raw_fd();
        trace!(fd, "socket descriptor released");
        self.released.borrow_mut().push(fd);
    }
}
