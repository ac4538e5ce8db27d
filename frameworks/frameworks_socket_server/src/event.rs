//! Event Objects
//!
//! Manual-reset events a client hands to a socket subscription. An event stays
//! signalled until it is reset.

use std::sync::atomic::{AtomicBool, Ordering};
use usecases_socket_events::Waitable;

/// Waitable event
#[derive(Debug)]
pub struct Event {
    signaled: AtomicBool,
}

impl Event {
    /// Create an event
    ///
    /// # Arguments
    ///
    /// * `initial_state` - Start signalled
    ///
    /// # Examples
    ///
    /// ```rust
    /// use frameworks_socket_server::Event;
    /// use usecases_socket_events::Waitable;
    ///
    /// let event = Event::new(false);
    /// event.set();
    /// assert!(event.is_signaled());
    /// ```
    pub fn new(initial_state: bool) -> Self {
        Self {
            signaled: AtomicBool::new(initial_state),
        }
    }

    /// Current state
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}

impl Waitable for Event {
    fn set(&self) {
        self.signaled.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.signaled.store(false, Ordering::SeqCst);
    }
}
