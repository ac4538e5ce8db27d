//! Scripted descriptor and recording registry shared by the unit tests

use crate::collaborators::{PollRegistry, SocketDescriptor};
use entities_socket_events::{NetError, PollInterest, Readiness};
use std::cell::Cell;
use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::rc::Rc;

/// What the fake kernel reports for one descriptor
#[derive(Default)]
pub struct FakeOs {
    pub ready: Cell<Readiness>,
    pub eof: Cell<bool>,
    pub error: Cell<Option<NetError>>,
    pub accept_error: Cell<Option<NetError>>,
    pub peeks: Cell<usize>,
}

pub struct FakeDescriptor {
    fd: RawFd,
    os: Rc<FakeOs>,
}

impl FakeDescriptor {
    pub fn new(fd: RawFd) -> (Self, Rc<FakeOs>) {
        let os = Rc::new(FakeOs::default());
        (Self { fd, os: os.clone() }, os)
    }
}

impl SocketDescriptor for FakeDescriptor {
    fn raw_fd(&self) -> RawFd {
        self.fd
    }

    fn peek_end_of_stream(&self) -> bool {
        self.os.peeks.set(self.os.peeks.get() + 1);
        self.os.eof.get()
    }

    fn take_error(&self) -> Option<NetError> {
        self.os.error.take()
    }

    fn probe(&self, interest: PollInterest) -> Readiness {
        let watched = Readiness::from_bits_truncate(interest.bits())
            | Readiness::ERROR
            | Readiness::HANGUP;
        self.os.ready.get() & watched
    }

    fn accept(&self) -> Result<Self, NetError> {
        if let Some(error) = self.os.accept_error.get() {
            return Err(error);
        }
        Ok(FakeDescriptor::new(self.fd + 1000).0)
    }
}

/// Registry that remembers the last interest per descriptor
#[derive(Default)]
pub struct RecordingRegistry {
    interests: HashMap<RawFd, PollInterest>,
    pub disabled: Vec<RawFd>,
    pub updates: usize,
}

impl RecordingRegistry {
    pub fn interest(&self, fd: RawFd) -> Option<PollInterest> {
        self.interests.get(&fd).copied()
    }
}

impl PollRegistry for RecordingRegistry {
    fn add_user(&mut self, fd: RawFd) -> Result<(), NetError> {
        self.interests.insert(fd, PollInterest::empty());
        Ok(())
    }

    fn set_interest(&mut self, fd: RawFd, interest: PollInterest) {
        self.updates += 1;
        self.interests.insert(fd, interest);
    }

    fn disable(&mut self, fd: RawFd) {
        self.interests.remove(&fd);
        self.disabled.push(fd);
    }
}
