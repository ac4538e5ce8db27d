//! Readiness-to-Event State Machine
//!
//! [`SocketRecord::poll_event`] is invoked once per readiness notification, either by
//! the polling loop or by the probe at the end of a reselection. The phase selects
//! the rule set:
//!
//! | Phase | Readiness | Effect |
//! |---|---|---|
//! | connecting | writable | connected, readable and writable |
//! | connecting | error / hang-up, not writable | connect failed, `SO_ERROR` recorded |
//! | listening | readable | accept pending and held |
//! | listening | error / hang-up | accept pending and held, `SO_ERROR` recorded |
//! | data | readable | read pending and held (unless the peek sees end-of-stream) |
//! | data | writable | write pending and held |
//! | data | priority | out-of-band pending and held |
//! | data | error, or hang-up without readable | close pending, capabilities dropped |
//!
//! Data-phase rules are independent and may all fire for one notification. A
//! notification carrying error or hang-up disables the descriptor in the polling loop
//! for good; any other notification ends with a reselection.

use crate::collaborators::{PollRegistry, SocketDescriptor};
use crate::config::HangupPeek;
use crate::record::{Registration, SocketRecord};
use entities_socket_events::{EventKind, NetError, Phase, Readiness};
use tracing::trace;

impl<D: SocketDescriptor> SocketRecord<D> {
    /// Apply one readiness notification
    ///
    /// # Arguments
    ///
    /// * `readiness` - Conditions reported for the descriptor
    /// * `registry` - Polling loop, updated or disabled afterwards
    pub fn poll_event(&mut self, readiness: Readiness, registry: &mut dyn PollRegistry) {
        let fd = self.descriptor.raw_fd();
        trace!(fd, ?readiness, "select event");

        let effective = self.transition(readiness);
        if effective.is_failure() {
            self.disable_registration(registry);
        } else {
            self.resync(registry);
        }
        self.notify();
    }

    /// Apply the phase's rules to one readiness report
    ///
    /// # Returns
    ///
    /// The readiness as interpreted, a half-closed peer showing up as hang-up
    pub(crate) fn transition(&mut self, readiness: Readiness) -> Readiness {
        match self.state.phase() {
            Phase::Connecting => self.connecting_event(readiness),
            Phase::Listening => self.listening_event(readiness),
            Phase::Normal => self.data_event(readiness),
        }
    }

    pub(crate) fn disable_registration(&mut self, registry: &mut dyn PollRegistry) {
        if self.registration == Registration::Active {
            registry.disable(self.descriptor.raw_fd());
        }
        self.registration = Registration::Disabled;
    }

    /// Signal the subscriber if it is owed a wakeup, then wake direct waiters
    pub(crate) fn notify(&self) {
        let owed = self.pending & self.mask;
        if !owed.is_empty() {
            trace!(fd = self.descriptor.raw_fd(), pending = ?owed, "pending events");
            if let Some(event) = &self.event {
                event.set();
            }
        }
        self.waiters.wake_all();
    }

    fn connecting_event(&mut self, readiness: Readiness) -> Readiness {
        // Writable wins; an error reported alongside disables the descriptor afterwards
        if readiness.contains(Readiness::WRITABLE) {
            self.connect_succeeded();
        } else if readiness.is_failure() {
            self.connect_failed();
        }
        readiness
    }

    fn listening_event(&mut self, readiness: Readiness) -> Readiness {
        if readiness.contains(Readiness::READABLE) {
            self.incoming_connection(None);
        } else if readiness.is_failure() {
            let error = self.descriptor.take_error();
            self.incoming_connection(error);
        }
        readiness
    }

    fn data_event(&mut self, mut readiness: Readiness) -> Readiness {
        if readiness.contains(Readiness::READABLE) {
            if self.config.hangup_peek == HangupPeek::Enabled
                && self.descriptor.peek_end_of_stream()
            {
                readiness = Readiness::HANGUP;
            } else {
                self.data_readable();
            }
        }
        if readiness.contains(Readiness::WRITABLE) {
            self.data_writable();
        }
        if readiness.contains(Readiness::PRIORITY) {
            self.out_of_band();
        }

        let hangup_only =
            readiness.contains(Readiness::HANGUP) && !readiness.contains(Readiness::READABLE);
        if (readiness.contains(Readiness::ERROR) || hangup_only) && self.state.is_data_capable() {
            self.connection_closed();
        }
        readiness
    }

    /// Connect completed: the socket is now connected, readable and writable
    pub fn connect_succeeded(&mut self) {
        self.state.connect_succeeded();
        self.raise(EventKind::Connect, None);
        trace!(fd = self.descriptor.raw_fd(), "connection success");
    }

    /// Connect failed: back to unconnected, with the socket error recorded
    pub fn connect_failed(&mut self) {
        self.state.connect_failed();
        let error = self.descriptor.take_error();
        self.raise(EventKind::Connect, error);
        trace!(fd = self.descriptor.raw_fd(), ?error, "connection failure");
    }

    /// Incoming connection (or failed one) on a listening socket
    pub fn incoming_connection(&mut self, error: Option<NetError>) {
        self.raise_held(EventKind::Accept, error);
    }

    /// Data available
    pub fn data_readable(&mut self) {
        self.raise_held(EventKind::Read, None);
        trace!(fd = self.descriptor.raw_fd(), "socket is readable");
    }

    /// Room to write
    pub fn data_writable(&mut self) {
        self.raise_held(EventKind::Write, None);
        trace!(fd = self.descriptor.raw_fd(), "socket is writable");
    }

    /// Out-of-band data available
    pub fn out_of_band(&mut self) {
        self.raise_held(EventKind::Oob, None);
        trace!(fd = self.descriptor.raw_fd(), "socket got OOB data");
    }

    /// Peer closed or the connection was aborted
    pub fn connection_closed(&mut self) {
        let error = self.descriptor.take_error();
        self.state.closed();
        self.raise(EventKind::Close, error);
        trace!(fd = self.descriptor.raw_fd(), ?error, "socket closed");
    }

    fn raise(&mut self, kind: EventKind, error: Option<NetError>) {
        self.pending.insert(kind.set());
        self.errors.set(kind, error);
    }

    fn raise_held(&mut self, kind: EventKind, error: Option<NetError>) {
        self.raise(kind, error);
        self.held.insert(kind.set());
    }
}
