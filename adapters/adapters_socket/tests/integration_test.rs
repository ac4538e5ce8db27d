//! Integration tests for adapters_socket crate
//!
//! These tests drive a socket record over real loopback sockets: a listener
//! reporting an incoming connection, and a connected pair observing a half-close.

use adapters_socket::*;
use entities_socket_events::*;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::os::unix::io::RawFd;
use std::thread;
use std::time::Duration;
use usecases_socket_events::*;

#[derive(Default)]
struct InterestTable {
    watched: HashMap<RawFd, PollInterest>,
}

impl PollRegistry for InterestTable {
    fn add_user(&mut self, fd: RawFd) -> Result<(), NetError> {
        self.watched.insert(fd, PollInterest::empty());
        Ok(())
    }

    fn set_interest(&mut self, fd: RawFd, interest: PollInterest) {
        self.watched.insert(fd, interest);
    }

    fn disable(&mut self, fd: RawFd) {
        self.watched.remove(&fd);
    }
}

fn settle<F: FnMut() -> bool>(mut done: F) -> bool {
    for _ in 0..200 {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

fn listening_record(
    table: &mut InterestTable,
) -> (SocketRecord<NativeSocket>, SocketAddr) {
    let socket = NativeSocket::open(libc::AF_INET, libc::SOCK_STREAM, 0).unwrap();
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    socket.inner().bind(&addr.into()).unwrap();
    socket.inner().listen(8).unwrap();
    let bound = socket.inner().local_addr().unwrap().as_socket().unwrap();

    let mut record = SocketRecord::create(
        socket,
        false,
        CreateFlags::empty(),
        SocketEventConfig::with_hangup_peek(HangupPeek::Enabled),
        table,
    );
    record.set_subscription(EventSet::ACCEPT | EventSet::READ | EventSet::CLOSE, None, table);
    record
        .enable(EventSet::empty(), StateFlags::LISTENING, StateFlags::empty(), table)
        .unwrap();
    (record, bound)
}

#[test]
fn test_datagram_record_over_native_socket() {
    let mut table = InterestTable::default();
    let socket = NativeSocket::open(libc::AF_INET, libc::SOCK_DGRAM, 0).unwrap();
    let connectionless = socket.is_connectionless();
    let mut record = SocketRecord::create(
        socket,
        connectionless,
        CreateFlags::empty(),
        SocketEventConfig::default(),
        &mut table,
    );

    // An unbound datagram socket is writable straight away: the probe latches it
    record.set_subscription(EventSet::WRITE, None, &mut table);
    assert!(record.pending().contains(EventSet::WRITE));
    assert!(record.held().contains(EventSet::WRITE));
}

#[test]
fn test_listener_reports_incoming_connection() {
    let mut table = InterestTable::default();
    let (mut listener, addr) = listening_record(&mut table);
    let fd = listener.descriptor().raw_fd();
    assert_eq!(table.watched.get(&fd), Some(&PollInterest::READABLE));

    let _client = TcpStream::connect(addr).unwrap();
    assert!(settle(|| {
        listener.reselect(&mut table);
        listener.pending().contains(EventSet::ACCEPT)
    }));
    assert_eq!(table.watched.get(&fd), Some(&PollInterest::empty()));

    let accepted = listener.accept(&mut table).unwrap();
    assert!(accepted.state().contains(StateFlags::CONNECTED));
    assert_eq!(table.watched.get(&fd), Some(&PollInterest::READABLE));
}

#[test]
fn test_peer_close_becomes_close_event() {
    let mut table = InterestTable::default();
    let (mut listener, addr) = listening_record(&mut table);
    let client = TcpStream::connect(addr).unwrap();
    assert!(settle(|| {
        listener.reselect(&mut table);
        listener.pending().contains(EventSet::ACCEPT)
    }));
    let mut accepted = listener.accept(&mut table).unwrap();

    drop(client);
    assert!(settle(|| {
        accepted.reselect(&mut table);
        accepted.pending().contains(EventSet::CLOSE)
    }));
    assert!(!accepted.state().is_data_capable());
    assert_eq!(accepted.registration(), Registration::Disabled);
}

#[test]
fn test_unknown_errno_maps_to_unknown_code() {
    assert_eq!(translate_errno(libc::ENOENT).code(), 99999);
    assert_eq!(translate_errno(libc::ECONNREFUSED).code(), 10061);
}
