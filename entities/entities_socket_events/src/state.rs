//! Socket State
//!
//! The state word combines the protocol phase (connecting, listening, connected),
//! the non-blocking flag and the data capability bits (readable / writable) consulted
//! by the poll-interest calculation.
//!
//! [`SocketState`] keeps the flags private so that every change goes through a named
//! transition. The one invariant enforced at every entry point is that a socket is
//! never connecting and listening at the same time.

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Raw socket state bits, in wire layout
    ///
    /// `READABLE`, `WRITABLE` and `CONNECTING` share their bit positions with the
    /// read, write and connect event kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateFlags: u32 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const CONNECTING = 1 << 4;
        const LISTENING = 0x1000_0000;
        const NONBLOCKING = 0x2000_0000;
        const CONNECTED = 0x4000_0000;
    }
}

/// Protocol phase derived from the state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A connect is in progress
    Connecting,
    /// The socket accepts incoming connections
    Listening,
    /// Unconnected, connected or closed; data flow rules apply
    Normal,
}

/// State errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    /// The requested flags would mark the socket connecting and listening
    #[error("socket cannot be connecting and listening at once")]
    ConflictingPhase,
}

/// Socket state with phase invariants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocketState {
    flags: StateFlags,
}

impl SocketState {
    /// Create a state from raw flags
    ///
    /// # Returns
    ///
    /// * `Ok(SocketState)` - Valid state
    /// * `Err(StateError)` - Connecting and listening both requested
    pub fn new(flags: StateFlags) -> Result<Self, StateError> {
        Self::validate(flags)?;
        Ok(Self { flags })
    }

    /// State of a freshly created, unconnected socket
    ///
    /// Connectionless sockets can send and receive immediately, so they start
    /// with both capability bits set.
    pub fn fresh(connectionless: bool) -> Self {
        let flags = if connectionless {
            StateFlags::READABLE | StateFlags::WRITABLE
        } else {
            StateFlags::empty()
        };
        Self { flags }
    }

    /// State of a socket produced by accept
    pub fn accepted(nonblocking: bool) -> Self {
        let mut flags = StateFlags::CONNECTED | StateFlags::READABLE | StateFlags::WRITABLE;
        if nonblocking {
            flags |= StateFlags::NONBLOCKING;
        }
        Self { flags }
    }

    fn validate(flags: StateFlags) -> Result<(), StateError> {
        if flags.contains(StateFlags::CONNECTING | StateFlags::LISTENING) {
            return Err(StateError::ConflictingPhase);
        }
        Ok(())
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        if self.flags.contains(StateFlags::CONNECTING) {
            Phase::Connecting
        } else if self.flags.contains(StateFlags::LISTENING) {
            Phase::Listening
        } else {
            Phase::Normal
        }
    }

    /// Raw flags
    pub fn flags(&self) -> StateFlags {
        self.flags
    }

    /// Raw flags in wire layout
    pub fn bits(&self) -> u32 {
        self.flags.bits()
    }

    /// Check whether all of `flags` are set
    pub fn contains(&self, flags: StateFlags) -> bool {
        self.flags.contains(flags)
    }

    /// `true` when nothing beyond the non-blocking flag is set
    ///
    /// An inert socket has no reason to be registered with the polling loop.
    pub fn is_inert(&self) -> bool {
        self.flags.difference(StateFlags::NONBLOCKING).is_empty()
    }

    /// `true` when the socket believes it can read or write
    pub fn is_data_capable(&self) -> bool {
        self.flags
            .intersects(StateFlags::READABLE | StateFlags::WRITABLE)
    }

    /// Mark the socket non-blocking
    pub fn set_nonblocking(&mut self) {
        self.flags.insert(StateFlags::NONBLOCKING);
    }

    /// Connect completed successfully
    pub fn connect_succeeded(&mut self) {
        self.flags.remove(StateFlags::CONNECTING);
        self.flags
            .insert(StateFlags::CONNECTED | StateFlags::READABLE | StateFlags::WRITABLE);
    }

    /// Connect failed; the socket falls back to unconnected
    pub fn connect_failed(&mut self) {
        self.flags.remove(StateFlags::CONNECTING);
    }

    /// Connection closed or aborted
    pub fn closed(&mut self) {
        self.flags
            .remove(StateFlags::CONNECTED | StateFlags::READABLE | StateFlags::WRITABLE);
    }

    /// Set then clear raw flags as requested by a client
    ///
    /// The adjustment is all-or-nothing: on error the state is left unchanged.
    ///
    /// # Arguments
    ///
    /// * `set` - Flags to set
    /// * `clear` - Flags to clear (applied after `set`)
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Flags updated
    /// * `Err(StateError)` - The result would violate the phase invariant
    pub fn apply(&mut self, set: StateFlags, clear: StateFlags) -> Result<(), StateError> {
        let flags = (self.flags | set).difference(clear);
        Self::validate(flags)?;
        self.flags = flags;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_stream_is_inert() {
        let state = SocketState::fresh(false);
        assert!(state.is_inert());
        assert!(!state.is_data_capable());
        assert_eq!(state.phase(), Phase::Normal);
    }

    #[test]
    fn test_fresh_datagram_is_capable() {
        let state = SocketState::fresh(true);
        assert!(state.contains(StateFlags::READABLE | StateFlags::WRITABLE));
        assert!(!state.is_inert());
    }

    #[test]
    fn test_nonblocking_alone_is_inert() {
        let mut state = SocketState::fresh(false);
        state.set_nonblocking();
        assert!(state.is_inert());
    }

    #[test]
    fn test_new_rejects_connecting_and_listening() {
        let result = SocketState::new(StateFlags::CONNECTING | StateFlags::LISTENING);
        assert_eq!(result, Err(StateError::ConflictingPhase));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut state = SocketState::new(StateFlags::LISTENING).unwrap();
        let result = state.apply(StateFlags::CONNECTING, StateFlags::empty());
        assert_eq!(result, Err(StateError::ConflictingPhase));
        assert_eq!(state.flags(), StateFlags::LISTENING);

        // Clearing listening in the same request makes it valid
        state
            .apply(StateFlags::CONNECTING, StateFlags::LISTENING)
            .unwrap();
        assert_eq!(state.phase(), Phase::Connecting);
    }

    #[test]
    fn test_connect_transitions() {
        let mut state = SocketState::new(StateFlags::CONNECTING).unwrap();
        state.connect_succeeded();
        assert_eq!(state.phase(), Phase::Normal);
        assert!(state.contains(StateFlags::CONNECTED | StateFlags::READABLE | StateFlags::WRITABLE));

        let mut failed = SocketState::new(StateFlags::CONNECTING).unwrap();
        failed.connect_failed();
        assert_eq!(failed.phase(), Phase::Normal);
        assert!(!failed.contains(StateFlags::CONNECTED));
        assert!(failed.is_inert());
    }

    #[test]
    fn test_closed_clears_capability() {
        let mut state = SocketState::accepted(true);
        state.closed();
        assert_eq!(state.flags(), StateFlags::NONBLOCKING);
    }

    #[test]
    fn test_connecting_shares_connect_event_bit() {
        assert_eq!(StateFlags::CONNECTING.bits(), crate::EventSet::CONNECT.bits());
        assert_eq!(StateFlags::READABLE.bits(), crate::EventSet::READ.bits());
        assert_eq!(StateFlags::WRITABLE.bits(), crate::EventSet::WRITE.bits());
    }
}
