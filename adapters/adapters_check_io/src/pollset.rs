//! Poll Set Conversions
//!
//! `poll(2)` speaks `POLLIN` / `POLLPRI` / `POLLOUT` on the way in and adds
//! `POLLERR` / `POLLHUP` / `POLLNVAL` on the way out. Error and hang-up are always
//! reported, whatever the requested events.

use entities_socket_events::{PollInterest, Readiness};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use std::os::fd::AsFd;
use tracing::trace;

/// `poll(2)` events for an interest set
pub fn interest_flags(interest: PollInterest) -> PollFlags {
    let mut flags = PollFlags::empty();
    if interest.contains(PollInterest::READABLE) {
        flags |= PollFlags::POLLIN;
    }
    if interest.contains(PollInterest::PRIORITY) {
        flags |= PollFlags::POLLPRI;
    }
    if interest.contains(PollInterest::WRITABLE) {
        flags |= PollFlags::POLLOUT;
    }
    flags
}

/// Readiness reported by `poll(2)`
///
/// An invalid descriptor (`POLLNVAL`) is reported as an error so the owner stops
/// polling it.
pub fn readiness_from_flags(flags: PollFlags) -> Readiness {
    let mut readiness = Readiness::empty();
    if flags.contains(PollFlags::POLLIN) {
        readiness |= Readiness::READABLE;
    }
    if flags.contains(PollFlags::POLLPRI) {
        readiness |= Readiness::PRIORITY;
    }
    if flags.contains(PollFlags::POLLOUT) {
        readiness |= Readiness::WRITABLE;
    }
    if flags.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
        readiness |= Readiness::ERROR;
    }
    if flags.contains(PollFlags::POLLHUP) {
        readiness |= Readiness::HANGUP;
    }
    readiness
}

/// Point-in-time readiness of one descriptor
///
/// Polls with a zero timeout; an interrupted or failed poll reports nothing.
///
/// # Arguments
///
/// * `fd` - Descriptor to check
/// * `interest` - Conditions asked for; error and hang-up are always included
pub fn probe_readiness<Fd: AsFd>(fd: &Fd, interest: PollInterest) -> Readiness {
    let mut fds = [PollFd::new(fd, interest_flags(interest))];
    match poll(&mut fds, 0) {
        Ok(0) => Readiness::empty(),
        Ok(_) => fds[0]
            .revents()
            .map(readiness_from_flags)
            .unwrap_or(Readiness::empty()),
        Err(Errno::EINTR) => Readiness::empty(),
        Err(errno) => {
            trace!(%errno, "probe failed");
            Readiness::empty()
        }
    }
}
