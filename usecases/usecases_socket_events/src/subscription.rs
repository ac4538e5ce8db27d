//! Subscription Protocol
//!
//! The three client-facing operations on a socket record:
//!
//! - [`SocketRecord::set_subscription`]: replace the mask and subscriber event
//! - [`SocketRecord::event_info`] and [`SocketRecord::service_clear`]: report the
//!   event state, optionally clearing the pending set for a service monitor
//! - [`SocketRecord::enable`]: acknowledge kinds and adjust state bits
//!
//! Handle lookup, access checks and reply marshalling belong to the caller.

use crate::collaborators::{PollRegistry, SharedEvent, SocketDescriptor};
use crate::record::SocketRecord;
use entities_socket_events::{EventSet, NetError, StateError, StateFlags};
use std::sync::Arc;
use tracing::debug;

/// Snapshot returned by a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEventInfo {
    /// Subscription mask
    pub mask: EventSet,
    /// Pending kinds
    pub pending: EventSet,
    /// Raw state bits
    pub state: StateFlags,
    /// Per-kind error codes, `0` for success, truncated to the caller's capacity
    pub errors: Vec<u32>,
}

/// Service-mode query arguments
#[derive(Default, Clone)]
pub struct ServiceQuery {
    /// Event the service monitor signals on; clearing is refused when it is the
    /// socket's registered subscriber event
    pub signal_event: Option<SharedEvent>,
    /// Companion event reset when the pending set is cleared
    pub companion_event: Option<SharedEvent>,
}

impl<D: SocketDescriptor> SocketRecord<D> {
    /// Replace the subscription
    ///
    /// The new event is signalled right away when something it subscribes to is
    /// already pending, so a connect or accept that completed before the subscription
    /// is not lost. A previous event watched in service mode is signalled before it is
    /// released so the monitor notices it was orphaned.
    ///
    /// # Arguments
    ///
    /// * `mask` - Kinds to be notified about; non-empty also makes the socket non-blocking
    /// * `event` - New subscriber event, or `None`
    /// * `registry` - Polling loop
    pub fn set_subscription(
        &mut self,
        mask: EventSet,
        event: Option<SharedEvent>,
        registry: &mut dyn PollRegistry,
    ) {
        let old_mask = std::mem::replace(&mut self.mask, mask);
        let old_event = std::mem::replace(&mut self.event, event);
        debug!(
            fd = self.descriptor.raw_fd(),
            mask = format_args!("{:x}", mask.bits()),
            event = self.event.is_some(),
            "set socket event"
        );

        self.reselect(registry);
        if !self.mask.is_empty() {
            self.state.set_nonblocking();
        }

        if !(self.pending & self.mask).is_empty() {
            if let Some(event) = &self.event {
                event.set();
            }
        }

        if let Some(old_event) = old_event {
            let replaced = match &self.event {
                Some(current) => !Arc::ptr_eq(current, &old_event),
                None => true,
            };
            if replaced && old_mask.contains(EventSet::SERVICE) {
                old_event.set();
            }
        }
    }

    /// Current event state
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of error entries the caller can receive
    pub fn event_info(&self, capacity: usize) -> SocketEventInfo {
        SocketEventInfo {
            mask: self.mask,
            pending: self.pending,
            state: self.state.flags(),
            errors: self.errors.truncated(capacity),
        }
    }

    /// Service-mode clearing step of a query
    ///
    /// Resets the companion event, empties the pending set and reselects. A signal
    /// event that is the active subscriber event leaves everything untouched.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Pending set cleared
    /// * `Err(NetError::InvalidArgument)` - The signal event is the registered one
    pub fn service_clear(
        &mut self,
        query: &ServiceQuery,
        registry: &mut dyn PollRegistry,
    ) -> Result<(), NetError> {
        if let Some(signal) = &query.signal_event {
            if self.is_subscriber(signal) {
                return Err(NetError::InvalidArgument);
            }
        }

        if let Some(companion) = &query.companion_event {
            companion.reset();
        }
        self.pending = EventSet::empty();
        self.reselect(registry);
        Ok(())
    }

    /// Query the event state, with the optional service-mode clearing step
    ///
    /// The snapshot is taken before anything is cleared.
    ///
    /// # Returns
    ///
    /// The snapshot, and the outcome of the clearing step (`Ok(())` when no service
    /// query was made)
    pub fn query(
        &mut self,
        capacity: usize,
        service: Option<&ServiceQuery>,
        registry: &mut dyn PollRegistry,
    ) -> (SocketEventInfo, Result<(), NetError>) {
        let info = self.event_info(capacity);
        let outcome = match service {
            Some(query) => self.service_clear(query, registry),
            None => Ok(()),
        };
        (info, outcome)
    }

    /// Acknowledge kinds and adjust state bits
    ///
    /// Acknowledged kinds leave both the pending and held sets, so the next
    /// occurrence is delivered again. Acknowledging the service-monitor kind instead
    /// marks it pending and signals the subscriber event unconditionally.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Applied
    /// * `Err(StateError)` - The adjustment would leave the socket both connecting and
    ///   listening; nothing changed
    pub fn enable(
        &mut self,
        ack: EventSet,
        set: StateFlags,
        clear: StateFlags,
        registry: &mut dyn PollRegistry,
    ) -> Result<(), StateError> {
        self.state.apply(set, clear)?;
        self.pending.remove(ack);
        self.held.remove(ack);
        self.reselect(registry);

        if ack.contains(EventSet::SERVICE) {
            self.pending.insert(EventSet::SERVICE);
            if let Some(event) = &self.event {
                debug!(fd = self.descriptor.raw_fd(), "signalling service event");
                event.set();
            }
        }
        Ok(())
    }

    /// `true` when `event` is the registered subscriber event
    pub fn is_subscriber(&self, event: &SharedEvent) -> bool {
        self.event
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockWaitable;
    use crate::config::SocketEventConfig;
    use crate::testing::{FakeDescriptor, FakeOs, RecordingRegistry};
    use entities_socket_events::{
        CreateFlags, EventKind, PollInterest, Readiness, EVENT_ERROR_SLOTS,
    };
    use std::rc::Rc;

    fn datagram(registry: &mut RecordingRegistry) -> (SocketRecord<FakeDescriptor>, Rc<FakeOs>) {
        let (descriptor, os) = FakeDescriptor::new(30);
        let record = SocketRecord::create(
            descriptor,
            true,
            CreateFlags::empty(),
            SocketEventConfig::default(),
            registry,
        );
        (record, os)
    }

    fn signalled(times: usize) -> SharedEvent {
        let mut event = MockWaitable::new();
        event.expect_set().times(times).return_const(());
        event.expect_reset().never();
        Arc::new(event)
    }

    #[test]
    fn test_subscribe_updates_interest_and_nonblocking() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);

        record.set_subscription(EventSet::READ | EventSet::WRITE, Some(signalled(0)), &mut registry);

        assert!(record.state().contains(StateFlags::NONBLOCKING));
        assert_eq!(registry.interest(30), Some(PollInterest::all()));
    }

    #[test]
    fn test_empty_mask_leaves_blocking_mode() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);

        record.set_subscription(EventSet::empty(), None, &mut registry);

        assert!(!record.state().contains(StateFlags::NONBLOCKING));
    }

    #[test]
    fn test_subscribe_signals_already_pending_event() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        record.pending = EventSet::CONNECT;

        record.set_subscription(EventSet::CONNECT, Some(signalled(1)), &mut registry);
    }

    #[test]
    fn test_replacing_service_event_signals_old_one() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        let old = signalled(1);
        record.set_subscription(EventSet::SERVICE, Some(old.clone()), &mut registry);

        record.set_subscription(EventSet::READ, Some(signalled(0)), &mut registry);

        assert_eq!(Arc::strong_count(&old), 1);
    }

    #[test]
    fn test_resubscribing_same_event_does_not_signal() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        let event = signalled(0);
        record.set_subscription(EventSet::SERVICE, Some(event.clone()), &mut registry);

        record.set_subscription(EventSet::READ, Some(event.clone()), &mut registry);

        assert!(record.is_subscriber(&event));
        assert_eq!(Arc::strong_count(&event), 2);
    }

    #[test]
    fn test_event_info_truncates_errors() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        record.pending = EventSet::CLOSE;
        record.errors.set(EventKind::Close, Some(NetError::ConnectionReset));

        let info = record.event_info(EVENT_ERROR_SLOTS);
        assert_eq!(info.pending, EventSet::CLOSE);
        assert_eq!(info.errors.len(), EVENT_ERROR_SLOTS);
        assert_eq!(info.errors[5], NetError::ConnectionReset.code());
        assert_eq!(info.errors[0], 0);

        assert_eq!(record.event_info(3).errors.len(), 3);
        assert!(record.event_info(0).errors.is_empty());
    }

    #[test]
    fn test_service_query_twice_clears_pending() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        record.set_subscription(EventSet::READ, Some(signalled(1)), &mut registry);
        record.poll_event(Readiness::READABLE, &mut registry);

        let service = ServiceQuery::default();
        let (first, outcome) = record.query(EVENT_ERROR_SLOTS, Some(&service), &mut registry);
        assert_eq!(first.pending, EventSet::READ);
        assert_eq!(outcome, Ok(()));

        let (second, outcome) = record.query(EVENT_ERROR_SLOTS, Some(&service), &mut registry);
        assert!(second.pending.is_empty());
        assert_eq!(outcome, Ok(()));
    }

    #[test]
    fn test_plain_query_never_clears() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        record.pending = EventSet::WRITE;

        let (info, outcome) = record.query(EVENT_ERROR_SLOTS, None, &mut registry);
        assert_eq!(info.pending, EventSet::WRITE);
        assert_eq!(outcome, Ok(()));
        assert_eq!(record.pending(), EventSet::WRITE);
    }

    #[test]
    fn test_service_query_refuses_active_subscriber() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        let event = signalled(0);
        record.set_subscription(EventSet::WRITE, Some(event.clone()), &mut registry);
        record.pending = EventSet::WRITE;

        let mut companion = MockWaitable::new();
        companion.expect_reset().never();
        let service = ServiceQuery {
            signal_event: Some(event),
            companion_event: Some(Arc::new(companion)),
        };
        let (info, outcome) = record.query(EVENT_ERROR_SLOTS, Some(&service), &mut registry);

        assert_eq!(outcome, Err(NetError::InvalidArgument));
        assert_eq!(info.pending, EventSet::WRITE);
        assert_eq!(record.pending(), EventSet::WRITE);
    }

    #[test]
    fn test_service_query_resets_companion() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        record.pending = EventSet::WRITE;

        let mut companion = MockWaitable::new();
        companion.expect_reset().times(1).return_const(());
        let service = ServiceQuery {
            signal_event: Some(signalled(0)),
            companion_event: Some(Arc::new(companion)),
        };

        assert_eq!(record.service_clear(&service, &mut registry), Ok(()));
        assert!(record.pending().is_empty());
    }

    #[test]
    fn test_enable_rearms_acknowledged_kind() {
        let mut registry = RecordingRegistry::default();
        let (mut record, os) = datagram(&mut registry);
        record.set_subscription(EventSet::WRITE, None, &mut registry);

        record.poll_event(Readiness::WRITABLE, &mut registry);
        assert!(record.held().contains(EventSet::WRITE));
        assert_eq!(registry.interest(30), Some(PollInterest::empty()));

        // Still writable: the probe after re-arming latches it again
        os.ready.set(Readiness::WRITABLE);
        record
            .enable(EventSet::WRITE, StateFlags::empty(), StateFlags::empty(), &mut registry)
            .unwrap();
        assert!(record.pending().contains(EventSet::WRITE));
        assert!(record.held().contains(EventSet::WRITE));

        os.ready.set(Readiness::empty());
        record
            .enable(EventSet::WRITE, StateFlags::empty(), StateFlags::empty(), &mut registry)
            .unwrap();
        assert!(!record.pending().contains(EventSet::WRITE));
        assert_eq!(registry.interest(30), Some(PollInterest::WRITABLE));
    }

    #[test]
    fn test_enable_rejects_conflicting_phase() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        record.pending = EventSet::READ;
        record
            .enable(EventSet::empty(), StateFlags::LISTENING, StateFlags::empty(), &mut registry)
            .unwrap();

        let result = record.enable(
            EventSet::READ,
            StateFlags::CONNECTING,
            StateFlags::empty(),
            &mut registry,
        );

        assert!(result.is_err());
        assert!(record.state().contains(StateFlags::LISTENING));
        assert!(!record.state().contains(StateFlags::CONNECTING));
        assert_eq!(record.pending(), EventSet::READ);
    }

    #[test]
    fn test_enable_service_kind_signals_monitor() {
        let mut registry = RecordingRegistry::default();
        let (mut record, _os) = datagram(&mut registry);
        let event = signalled(1);
        record.set_subscription(EventSet::READ, Some(event), &mut registry);

        record
            .enable(EventSet::SERVICE, StateFlags::empty(), StateFlags::empty(), &mut registry)
            .unwrap();

        assert!(record.pending().contains(EventSet::SERVICE));
    }

    #[test]
    fn test_enable_state_bits_reach_interest() {
        let mut registry = RecordingRegistry::default();
        let (descriptor, _os) = FakeDescriptor::new(31);
        let mut record = SocketRecord::create(
            descriptor,
            false,
            CreateFlags::empty(),
            SocketEventConfig::default(),
            &mut registry,
        );
        record.set_subscription(EventSet::CONNECT, None, &mut registry);
        assert_eq!(registry.interest(31), None);

        record
            .enable(EventSet::empty(), StateFlags::CONNECTING, StateFlags::empty(), &mut registry)
            .unwrap();
        assert_eq!(registry.interest(31), Some(PollInterest::WRITABLE));
    }
}
