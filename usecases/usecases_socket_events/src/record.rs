//! Socket Record
//!
//! One record exists per native socket. It owns the descriptor, the event masks,
//! the per-kind errors, the optional overlapped queues and a shared reference to the
//! subscriber event.
//!
//! ## Masks
//!
//! - `mask`: kinds the subscriber wants to hear about
//! - `held`: kinds already delivered and latched; they are left out of the poll
//!   interest until the subscriber acknowledges them, which makes delivery
//!   edge-triggered
//! - `pending`: kinds that occurred and have not been cleared; reported by queries
//!
//! ## Lifecycle
//!
//! A record is created unconnected ([`SocketRecord::create`]) or spawned from a
//! listening record ([`SocketRecord::accept`]). Dropping it is the destroy step:
//! overlapped queues are destroyed, the subscriber event is released (signalled first
//! when a service monitor is watching) and the descriptor closes with it.

use crate::async_queue::AsyncQueues;
use crate::collaborators::{PollRegistry, SharedEvent, SocketDescriptor};
use crate::config::SocketEventConfig;
use crate::interest::compute_interest;
use crate::wait_queue::WaitQueue;
use entities_socket_events::{
    CreateFlags, ErrorSlots, EventKind, EventSet, NetError, PollInterest, SocketState, StateFlags,
};
use std::fmt;
use tracing::{debug, trace, warn};

/// Registration of a descriptor with the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Never registered; the socket has had no reason to be polled yet
    Unregistered,
    /// Registered; the interest follows every reselection
    Active,
    /// The descriptor reported an error or hang-up and is never polled again
    Disabled,
}

/// File type reported for socket handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Sockets present themselves as pipes
    Pipe,
}

/// File information for a socket handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    /// Always [`FileType::Pipe`]
    pub file_type: FileType,
    /// Attributes, always zero
    pub attributes: u32,
    /// Size in bytes, always zero
    pub size: u64,
    /// `true` when the socket was created in overlapped mode
    pub overlapped: bool,
}

/// Socket record
pub struct SocketRecord<D: SocketDescriptor> {
    pub(crate) descriptor: D,
    pub(crate) state: SocketState,
    pub(crate) mask: EventSet,
    pub(crate) held: EventSet,
    pub(crate) pending: EventSet,
    pub(crate) flags: CreateFlags,
    pub(crate) errors: ErrorSlots,
    pub(crate) event: Option<SharedEvent>,
    pub(crate) queues: Option<AsyncQueues>,
    pub(crate) registration: Registration,
    pub(crate) waiters: WaitQueue,
    pub(crate) config: SocketEventConfig,
}

impl<D: SocketDescriptor> SocketRecord<D> {
    /// Wrap a freshly opened socket
    ///
    /// The record starts unconnected with every mask empty and no subscriber event.
    /// Connectionless sockets are immediately readable and writable.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Native non-blocking socket
    /// * `connectionless` - `true` for anything but stream sockets
    /// * `flags` - Creation flags; overlapped mode creates the async queues
    /// * `config` - Event configuration
    /// * `registry` - Polling loop
    pub fn create(
        descriptor: D,
        connectionless: bool,
        flags: CreateFlags,
        config: SocketEventConfig,
        registry: &mut dyn PollRegistry,
    ) -> Self {
        let mut record = Self {
            descriptor,
            state: SocketState::fresh(connectionless),
            mask: EventSet::empty(),
            held: EventSet::empty(),
            pending: EventSet::empty(),
            flags,
            errors: ErrorSlots::default(),
            event: None,
            queues: None,
            registration: Registration::Unregistered,
            waiters: WaitQueue::new(),
            config,
        };
        debug!(fd = record.descriptor.raw_fd(), connectionless, "created socket");
        record.reselect(registry);
        if flags.contains(CreateFlags::OVERLAPPED) {
            record.queues = Some(AsyncQueues::new());
        }
        record
    }

    /// Accept a pending connection on this listening socket
    ///
    /// The new record inherits the non-blocking flag, the subscription mask and the
    /// creation flags. It shares the subscriber event unless the mask carries the
    /// service monitor kind. The accept event is cleared from this socket's pending
    /// and held sets so further connections can be reported.
    ///
    /// # Returns
    ///
    /// * `Ok(SocketRecord)` - The connected socket
    /// * `Err(NetError)` - Accept failed; this socket is untouched
    pub fn accept(&mut self, registry: &mut dyn PollRegistry) -> Result<Self, NetError> {
        let descriptor = self.descriptor.accept()?;

        let event = if self.mask.contains(EventSet::SERVICE) {
            None
        } else {
            self.event.clone()
        };
        let nonblocking = self.state.contains(StateFlags::NONBLOCKING);
        let queues = self
            .flags
            .contains(CreateFlags::OVERLAPPED)
            .then(AsyncQueues::new);

        let mut accepted = Self {
            descriptor,
            state: SocketState::accepted(nonblocking),
            mask: self.mask,
            held: EventSet::empty(),
            pending: EventSet::empty(),
            flags: self.flags,
            errors: ErrorSlots::default(),
            event,
            queues,
            registration: Registration::Unregistered,
            waiters: WaitQueue::new(),
            config: self.config,
        };
        debug!(
            listener = self.descriptor.raw_fd(),
            fd = accepted.descriptor.raw_fd(),
            "accepted socket"
        );
        accepted.reselect(registry);

        self.pending.remove(EventSet::ACCEPT);
        self.held.remove(EventSet::ACCEPT);
        self.reselect(registry);
        Ok(accepted)
    }

    /// Re-synchronize the polling loop with the current interest
    ///
    /// Safe to call any number of times. An inert socket that was never registered
    /// stays unregistered; a disabled descriptor is left alone. After updating the
    /// interest, a zero-timeout probe catches conditions that became true before the
    /// update and feeds them straight into the state machine.
    pub fn reselect(&mut self, registry: &mut dyn PollRegistry) {
        if self.resync(registry) {
            self.notify();
        }
    }

    /// Update the registration, then apply probed readiness until nothing changes
    ///
    /// Iterates instead of re-entering the state machine: a condition the kernel keeps
    /// reporting (pending urgent data) ends the loop once its kind is latched.
    ///
    /// # Returns
    ///
    /// `true` if any probed readiness was applied
    pub(crate) fn resync(&mut self, registry: &mut dyn PollRegistry) -> bool {
        let fd = self.descriptor.raw_fd();
        let mut applied = false;
        loop {
            let interest = self.poll_interest();
            trace!(fd, ?interest, "reselect");

            match self.registration {
                Registration::Disabled => return applied,
                Registration::Unregistered => {
                    if self.state.is_inert() {
                        return applied;
                    }
                    if let Err(error) = registry.add_user(fd) {
                        warn!(fd, %error, "polling loop refused descriptor");
                        return applied;
                    }
                    self.registration = Registration::Active;
                }
                Registration::Active => {}
            }
            registry.set_interest(fd, interest);

            let ready = self.descriptor.probe(interest);
            if ready.is_empty() {
                return applied;
            }
            trace!(fd, ?ready, "condition already satisfied");
            let before = (self.state, self.pending, self.held);
            let effective = self.transition(ready);
            applied = true;
            if effective.is_failure() {
                self.disable_registration(registry);
                return applied;
            }
            if (self.state, self.pending, self.held) == before {
                return applied;
            }
        }
    }

    /// Conditions this socket wants the polling loop to watch
    pub fn poll_interest(&self) -> PollInterest {
        compute_interest(&self.state, self.mask, self.held)
    }

    /// `true` when a party waiting on the socket object should wake up
    pub fn is_signaled(&self) -> bool {
        !self.descriptor.probe(self.poll_interest()).is_empty()
    }

    /// Queue a party waiting directly on the socket object
    pub fn add_waiter(&mut self, waiter: SharedEvent) {
        self.waiters.add(waiter);
    }

    /// Remove a party waiting directly on the socket object
    pub fn remove_waiter(&mut self, waiter: &SharedEvent) -> bool {
        self.waiters.remove(waiter)
    }

    /// File information reported for the socket handle
    pub fn file_info(&self) -> FileInfo {
        FileInfo {
            file_type: FileType::Pipe,
            attributes: 0,
            size: 0,
            overlapped: self.flags.contains(CreateFlags::OVERLAPPED),
        }
    }

    /// The native descriptor
    pub fn descriptor(&self) -> &D {
        &self.descriptor
    }

    /// Current state
    pub fn state(&self) -> SocketState {
        self.state
    }

    /// Subscription mask
    pub fn mask(&self) -> EventSet {
        self.mask
    }

    /// Held (latched) kinds
    pub fn held(&self) -> EventSet {
        self.held
    }

    /// Pending kinds
    pub fn pending(&self) -> EventSet {
        self.pending
    }

    /// Last error recorded for `kind`; meaningful only while `kind` is pending
    pub fn error(&self, kind: EventKind) -> Option<NetError> {
        self.errors.get(kind)
    }

    /// Registration with the polling loop
    pub fn registration(&self) -> Registration {
        self.registration
    }

    /// Overlapped queues, if the socket was created in overlapped mode
    pub fn queues_mut(&mut self) -> Option<&mut AsyncQueues> {
        self.queues.as_mut()
    }

    /// `true` when a subscriber event is attached
    pub fn has_event(&self) -> bool {
        self.event.is_some()
    }
}

impl<D: SocketDescriptor> Drop for SocketRecord<D> {
    fn drop(&mut self) {
        let fd = self.descriptor.raw_fd();
        if let Some(queues) = self.queues.take() {
            let cancelled = queues.destroy();
            debug!(fd, cancelled, "destroyed async queues");
        }
        if let Some(event) = self.event.take() {
            // Let a service monitor notice the socket is gone
            if self.mask.contains(EventSet::SERVICE) {
                event.set();
            }
        }
        debug!(fd, "destroyed socket");
    }
}

impl<D: SocketDescriptor> fmt::Display for SocketRecord<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Socket fd={}, state={:x}, mask={:x}, pending={:x}, held={:x}",
            self.descriptor.raw_fd(),
            self.state.bits(),
            self.mask.bits(),
            self.pending.bits(),
            self.held.bits()
        )
    }
}
