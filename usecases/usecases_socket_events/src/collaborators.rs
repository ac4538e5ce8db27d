//! Collaborator Interfaces
//!
//! The socket record depends on three things it does not implement: the native
//! descriptor, the central polling loop and the waitable event objects used to
//! notify subscribers. Each is reached through a trait so the state machine can be
//! driven by real sockets in the adapters layer and by fakes in tests.

use entities_socket_events::{NetError, PollInterest, Readiness};
use std::os::unix::io::RawFd;
use std::sync::Arc;

/// Native non-blocking socket owned by a record
///
/// Every call must return immediately.
pub trait SocketDescriptor {
    /// Descriptor number used as the polling loop key
    fn raw_fd(&self) -> RawFd;

    /// Zero-length peek: `true` when the peer has closed its write side
    fn peek_end_of_stream(&self) -> bool;

    /// Pending socket error (`SO_ERROR`), translated; reading it clears it
    fn take_error(&self) -> Option<NetError>;

    /// Point-in-time readiness check against `interest`
    ///
    /// Error and hang-up are reported even when not asked for.
    fn probe(&self, interest: PollInterest) -> Readiness;

    /// Accept one pending connection
    fn accept(&self) -> Result<Self, NetError>
    where
        Self: Sized;
}

/// Central polling loop registration
#[cfg_attr(test, mockall::automock)]
pub trait PollRegistry {
    /// Start watching `fd`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The descriptor is now known to the loop
    /// * `Err(NetError)` - The loop cannot take another descriptor
    fn add_user(&mut self, fd: RawFd) -> Result<(), NetError>;

    /// Replace the conditions watched for `fd`
    fn set_interest(&mut self, fd: RawFd, interest: PollInterest);

    /// Stop reporting anything for `fd`
    fn disable(&mut self, fd: RawFd);
}

/// Waitable event object shared with a subscriber
#[cfg_attr(test, mockall::automock)]
pub trait Waitable: Send + Sync {
    /// Signal the event
    fn set(&self);

    /// Return the event to the non-signalled state
    fn reset(&self);
}

/// Reference-counted subscriber event
pub type SharedEvent = Arc<dyn Waitable>;
