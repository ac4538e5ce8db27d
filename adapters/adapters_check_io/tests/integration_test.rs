//! Integration tests for adapters_check_io crate
//!
//! A socket record registered with the real polling loop: sweeps report the
//! descriptor, the record consumes the readiness and its new interest lands back in
//! the registry.

use adapters_check_io::*;
use entities_socket_events::*;
use std::cell::Cell;
use std::io::Write;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::time::Duration;
use usecases_socket_events::*;

struct PairEnd {
    stream: UnixStream,
    error: Cell<Option<NetError>>,
}

impl SocketDescriptor for PairEnd {
    fn raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    fn peek_end_of_stream(&self) -> bool {
        false
    }

    fn take_error(&self) -> Option<NetError> {
        self.error.take()
    }

    fn probe(&self, interest: PollInterest) -> Readiness {
        probe_readiness(&self.stream, interest)
    }

    fn accept(&self) -> Result<Self, NetError> {
        Err(NetError::OperationNotSupported)
    }
}

fn connected_record(
    check_io: &mut CheckIo,
) -> (SocketRecord<PairEnd>, UnixStream) {
    let (local, remote) = UnixStream::pair().unwrap();
    local.set_nonblocking(true).unwrap();
    let end = PairEnd {
        stream: local,
        error: Cell::new(None),
    };
    let record = SocketRecord::create(
        end,
        true,
        CreateFlags::empty(),
        SocketEventConfig::with_hangup_peek(HangupPeek::Disabled),
        check_io,
    );
    (record, remote)
}

#[test]
fn test_sweep_feeds_record_and_latches() {
    let mut check_io = CheckIo::new();
    let (mut record, mut remote) = connected_record(&mut check_io);
    let fd = record.descriptor().raw_fd();
    record.set_subscription(EventSet::READ, None, &mut check_io);
    assert_eq!(
        check_io.interest(fd),
        Some(PollInterest::READABLE | PollInterest::PRIORITY)
    );

    remote.write_all(b"data").unwrap();
    let events = check_io.check(Some(Duration::from_secs(1))).unwrap();
    assert_eq!(events.len(), 1);
    record.poll_event(events[0].readiness, &mut check_io);

    assert!(record.pending().contains(EventSet::READ));
    assert_eq!(check_io.interest(fd), Some(PollInterest::empty()));

    // Latched: unread data no longer wakes the loop
    let events = check_io.check(Some(Duration::from_millis(10))).unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_hangup_disables_descriptor() {
    let mut check_io = CheckIo::new();
    let (mut record, remote) = connected_record(&mut check_io);
    let fd = record.descriptor().raw_fd();
    record.set_subscription(EventSet::CLOSE, None, &mut check_io);

    drop(remote);
    let events = check_io.check(Some(Duration::from_secs(1))).unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].readiness.contains(Readiness::HANGUP));
    record.poll_event(events[0].readiness, &mut check_io);

    assert!(record.pending().contains(EventSet::CLOSE));
    assert!(!check_io.is_enabled(fd));
    assert!(check_io.check(Some(Duration::from_millis(10))).unwrap().is_empty());
    assert!(check_io.remove_user(fd));
}

#[test]
fn test_registry_full_leaves_record_unregistered() {
    let mut check_io = CheckIo::with_config(CheckIoConfig { max_files: 0 });
    let (record, _remote) = connected_record(&mut check_io);
    assert_eq!(record.registration(), Registration::Unregistered);
    assert_eq!(check_io.info().registered, 0);
}
