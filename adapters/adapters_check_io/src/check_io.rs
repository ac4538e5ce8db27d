//! I/O Checking Module
//!
//! The central polling loop socket records register with. Each registered descriptor
//! has a stored interest set that reselection overwrites; a descriptor that reported
//! an error or hang-up is disabled and left out of every later sweep until its owner
//! removes it.
//!
//! ## Overview
//!
//! - [`CheckIo::register`] / [`CheckIo::update`] / [`CheckIo::disable_fd`] /
//!   [`CheckIo::remove_user`] maintain the registry
//! - [`CheckIo::check`] waits for readiness on every enabled descriptor and returns
//!   the events; dispatching them to their owners is the caller's job
//!
//! The registry is also the socket record's [`PollRegistry`] collaborator.

use crate::pollset::{interest_flags, readiness_from_flags};
use entities_socket_events::{NetError, PollInterest, Readiness};
use nix::errno::Errno;
use nix::poll::{poll, PollFd};
use std::collections::BTreeMap;
use std::os::fd::BorrowedFd;
use std::os::unix::io::RawFd;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};
use usecases_socket_events::PollRegistry;

/// Readiness reported for one descriptor by a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoEvent {
    /// Descriptor that became ready
    pub fd: RawFd,
    /// Conditions reported
    pub readiness: Readiness,
}

/// Check I/O configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckIoConfig {
    /// Maximum number of registered descriptors
    pub max_files: usize,
}

impl Default for CheckIoConfig {
    fn default() -> Self {
        Self { max_files: 1024 }
    }
}

/// Check I/O errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckIoError {
    /// Negative or unknown descriptor
    #[error("invalid file descriptor {0}")]
    InvalidFd(RawFd),
    /// Registry is full
    #[error("too many registered descriptors (limit {0})")]
    TooManyFiles(usize),
    /// `poll(2)` failed
    #[error("poll failed: {0}")]
    PollFailed(#[source] Errno),
}

impl From<CheckIoError> for NetError {
    fn from(error: CheckIoError) -> Self {
        match error {
            CheckIoError::InvalidFd(_) => NetError::BadDescriptor,
            CheckIoError::TooManyFiles(_) => NetError::TooManyOpenFiles,
            CheckIoError::PollFailed(_) => NetError::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Watch {
    interest: PollInterest,
    disabled: bool,
}

/// Check I/O manager
pub struct CheckIo {
    config: CheckIoConfig,
    watches: BTreeMap<RawFd, Watch>,
}

impl CheckIo {
    /// Create a new check I/O manager with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckIoConfig::default())
    }

    /// Create a new check I/O manager with custom configuration
    pub fn with_config(config: CheckIoConfig) -> Self {
        Self {
            config,
            watches: BTreeMap::new(),
        }
    }

    /// Start watching a descriptor with an empty interest set
    ///
    /// Registering a descriptor number again starts it over: the number belongs to a
    /// new descriptor, so a stale interest or disabled flag is dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Registered
    /// * `Err(CheckIoError)` - Negative descriptor, or the registry is full
    pub fn register(&mut self, fd: RawFd) -> Result<(), CheckIoError> {
        if fd < 0 {
            return Err(CheckIoError::InvalidFd(fd));
        }
        let known = self.watches.contains_key(&fd);
        if !known && self.watches.len() >= self.config.max_files {
            return Err(CheckIoError::TooManyFiles(self.config.max_files));
        }
        if known {
            warn!(fd, "descriptor registered again, dropping stale watch");
        }
        self.watches.insert(
            fd,
            Watch {
                interest: PollInterest::empty(),
                disabled: false,
            },
        );
        debug!(fd, "added select user");
        Ok(())
    }

    /// Replace the interest of a registered descriptor
    ///
    /// A disabled descriptor keeps its interest recorded but stays out of sweeps.
    pub fn update(&mut self, fd: RawFd, interest: PollInterest) -> Result<(), CheckIoError> {
        let watch = self
            .watches
            .get_mut(&fd)
            .ok_or(CheckIoError::InvalidFd(fd))?;
        watch.interest = interest;
        trace!(fd, ?interest, "set select events");
        Ok(())
    }

    /// Leave a descriptor out of every later sweep
    pub fn disable_fd(&mut self, fd: RawFd) {
        if let Some(watch) = self.watches.get_mut(&fd) {
            watch.disabled = true;
            debug!(fd, "disabled select user");
        }
    }

    /// Forget a descriptor; must happen before it is closed
    ///
    /// # Returns
    ///
    /// `true` if the descriptor was registered
    pub fn remove_user(&mut self, fd: RawFd) -> bool {
        let removed = self.watches.remove(&fd).is_some();
        if removed {
            debug!(fd, "removed select user");
        }
        removed
    }

    /// Stored interest, `None` when not registered
    pub fn interest(&self, fd: RawFd) -> Option<PollInterest> {
        self.watches.get(&fd).map(|watch| watch.interest)
    }

    /// `true` when registered and not disabled
    pub fn is_enabled(&self, fd: RawFd) -> bool {
        self.watches.get(&fd).is_some_and(|watch| !watch.disabled)
    }

    /// Wait for readiness on every enabled descriptor
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait (`None` = wait indefinitely)
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<IoEvent>)` - Ready descriptors, ordered by descriptor; empty on
    ///   timeout or interruption
    /// * `Err(CheckIoError)` - `poll(2)` failed
    pub fn check(&self, timeout: Option<Duration>) -> Result<Vec<IoEvent>, CheckIoError> {
        let enabled: Vec<(RawFd, PollInterest)> = self
            .watches
            .iter()
            .filter(|(_, watch)| !watch.disabled)
            .map(|(fd, watch)| (*fd, watch.interest))
            .collect();
        // SAFETY: registered descriptors stay open until their owner calls
        // `remove_user`, and `&self` keeps the registry unchanged for this call.
        let borrowed: Vec<BorrowedFd<'_>> = enabled
            .iter()
            .map(|(fd, _)| unsafe { BorrowedFd::borrow_raw(*fd) })
            .collect();
        let mut fds: Vec<PollFd<'_>> = borrowed
            .iter()
            .zip(&enabled)
            .map(|(fd, (_, interest))| PollFd::new(fd, interest_flags(*interest)))
            .collect();

        match poll(&mut fds, poll_timeout(timeout)) {
            Ok(0) => return Ok(Vec::new()),
            Ok(_) => {}
            Err(Errno::EINTR) => return Ok(Vec::new()),
            Err(errno) => {
                warn!(%errno, "poll failed");
                return Err(CheckIoError::PollFailed(errno));
            }
        }

        let events = fds
            .iter()
            .zip(&enabled)
            .filter_map(|(pollfd, (fd, _))| {
                let readiness = pollfd.revents().map(readiness_from_flags)?;
                (!readiness.is_empty()).then_some(IoEvent {
                    fd: *fd,
                    readiness,
                })
            })
            .collect();
        Ok(events)
    }

    /// Check I/O information
    pub fn info(&self) -> CheckIoInfo {
        CheckIoInfo {
            config: self.config,
            registered: self.watches.len(),
            enabled: self.watches.values().filter(|watch| !watch.disabled).count(),
        }
    }

    /// Maximum number of registered descriptors
    pub fn max_files(&self) -> usize {
        self.config.max_files
    }
}

fn poll_timeout(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(duration) => duration.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
    }
}

impl Default for CheckIo {
    fn default() -> Self {
        Self::new()
    }
}

impl PollRegistry for CheckIo {
    fn add_user(&mut self, fd: RawFd) -> Result<(), NetError> {
        self.register(fd).map_err(NetError::from)
    }

    fn set_interest(&mut self, fd: RawFd, interest: PollInterest) {
        if let Err(error) = self.update(fd, interest) {
            warn!(fd, %error, "interest update for unregistered descriptor");
        }
    }

    fn disable(&mut self, fd: RawFd) {
        self.disable_fd(fd);
    }
}

/// Check I/O information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckIoInfo {
    /// Configuration
    pub config: CheckIoConfig,
    /// Registered descriptors, disabled ones included
    pub registered: usize,
    /// Descriptors included in sweeps
    pub enabled: usize,
}
