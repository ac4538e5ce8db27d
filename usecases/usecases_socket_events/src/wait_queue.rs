//! Direct Waiters
//!
//! Besides the subscriber event, a party can wait on the socket object itself.
//! Those waiters are woken after every readiness notification and decide for
//! themselves whether the socket is signalled.

use crate::collaborators::SharedEvent;
use std::sync::Arc;

/// Parties blocked on a socket object
#[derive(Default)]
pub struct WaitQueue {
    waiters: Vec<SharedEvent>,
}

impl WaitQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a waiter
    pub fn add(&mut self, waiter: SharedEvent) {
        self.waiters.push(waiter);
    }

    /// Remove a waiter
    ///
    /// # Returns
    ///
    /// `true` if the waiter was queued
    pub fn remove(&mut self, waiter: &SharedEvent) -> bool {
        let before = self.waiters.len();
        self.waiters.retain(|queued| !Arc::ptr_eq(queued, waiter));
        self.waiters.len() != before
    }

    /// Wake every waiter
    ///
    /// # Returns
    ///
    /// Number of waiters woken
    pub fn wake_all(&self) -> usize {
        for waiter in &self.waiters {
            waiter.set();
        }
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockWaitable;

    #[test]
    fn test_wake_all_signals_each_waiter() {
        let mut first = MockWaitable::new();
        first.expect_set().times(1).return_const(());
        let mut second = MockWaitable::new();
        second.expect_set().times(1).return_const(());

        let mut queue = WaitQueue::new();
        queue.add(Arc::new(first));
        queue.add(Arc::new(second));
        assert_eq!(queue.wake_all(), 2);
    }

    #[test]
    fn test_remove_by_identity() {
        let waiter: SharedEvent = Arc::new(MockWaitable::new());
        let other: SharedEvent = Arc::new(MockWaitable::new());

        let mut queue = WaitQueue::new();
        queue.add(waiter.clone());
        assert!(!queue.remove(&other));
        assert!(queue.remove(&waiter));
        assert_eq!(queue.wake_all(), 0);
    }
}
