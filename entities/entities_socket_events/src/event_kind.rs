//! Network Event Kinds
//!
//! The universe of network events a subscriber can ask to be told about is fixed
//! and exhaustive. Each kind owns one bit in an [`EventSet`]; the first ten kinds
//! also own a slot in the per-kind error array.
//!
//! The service monitor kind is not raised by the network. It is set by a client to
//! let an external monitor detect that the socket is still alive, or signalled at
//! destruction so the monitor notices it has been orphaned.

use bitflags::bitflags;

/// Number of per-kind error slots reported to clients
pub const EVENT_ERROR_SLOTS: usize = 10;

bitflags! {
    /// Tagged set of network event kinds
    ///
    /// Used for the subscription mask, the held (latched) mask and the pending mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventSet: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const OOB = 1 << 2;
        const ACCEPT = 1 << 3;
        const CONNECT = 1 << 4;
        const CLOSE = 1 << 5;
        const QOS = 1 << 6;
        const GROUP_QOS = 1 << 7;
        const ROUTING_INTERFACE_CHANGE = 1 << 8;
        const ADDRESS_LIST_CHANGE = 1 << 9;
        /// Service monitor liveness / orphan detection
        const SERVICE = 1 << 31;
    }
}

/// Network event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Data available for reading
    Read,
    /// Ready for writing
    Write,
    /// Out-of-band data available
    Oob,
    /// Incoming connection on a listening socket
    Accept,
    /// Connect completed (successfully or not)
    Connect,
    /// Peer closed or connection aborted
    Close,
    /// Quality of service change
    Qos,
    /// Group quality of service change
    GroupQos,
    /// Routing interface change
    RoutingInterfaceChange,
    /// Address list change
    AddressListChange,
    /// Service monitor trigger
    ServiceMonitor,
}

impl EventKind {
    /// Every event kind, in error-slot order
    pub const ALL: [EventKind; 11] = [
        EventKind::Read,
        EventKind::Write,
        EventKind::Oob,
        EventKind::Accept,
        EventKind::Connect,
        EventKind::Close,
        EventKind::Qos,
        EventKind::GroupQos,
        EventKind::RoutingInterfaceChange,
        EventKind::AddressListChange,
        EventKind::ServiceMonitor,
    ];

    /// Single-kind set for this kind
    pub fn set(self) -> EventSet {
        match self {
            EventKind::Read => EventSet::READ,
            EventKind::Write => EventSet::WRITE,
            EventKind::Oob => EventSet::OOB,
            EventKind::Accept => EventSet::ACCEPT,
            EventKind::Connect => EventSet::CONNECT,
            EventKind::Close => EventSet::CLOSE,
            EventKind::Qos => EventSet::QOS,
            EventKind::GroupQos => EventSet::GROUP_QOS,
            EventKind::RoutingInterfaceChange => EventSet::ROUTING_INTERFACE_CHANGE,
            EventKind::AddressListChange => EventSet::ADDRESS_LIST_CHANGE,
            EventKind::ServiceMonitor => EventSet::SERVICE,
        }
    }

    /// Index of this kind in the per-kind error array
    ///
    /// # Returns
    ///
    /// * `Some(index)` - Kinds raised by the network
    /// * `None` - The service monitor kind, which never carries an error
    pub fn error_slot(self) -> Option<usize> {
        match self {
            EventKind::ServiceMonitor => None,
            kind => Some(kind as usize),
        }
    }
}

impl From<EventKind> for EventSet {
    fn from(kind: EventKind) -> Self {
        kind.set()
    }
}

impl EventSet {
    /// Kinds contained in this set, in error-slot order
    pub fn kinds(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.set()))
    }

    /// Build a set from a client-supplied mask, dropping unknown bits
    pub fn from_wire(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}
