//! Asynchronous Operation Queues
//!
//! Sockets created in overlapped mode own one queue for reads and one for writes.
//! The record only creates and destroys them; completing queued operations is the
//! business of the asynchronous I/O machinery that fills them.

use std::collections::VecDeque;
use tracing::debug;

/// Direction served by a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDirection {
    /// Overlapped reads
    Read,
    /// Overlapped writes
    Write,
}

/// Queue of outstanding asynchronous operations
///
/// Operations are identified by the opaque user token supplied when queued.
#[derive(Debug)]
pub struct AsyncQueue {
    direction: QueueDirection,
    pending: VecDeque<u64>,
}

impl AsyncQueue {
    /// Create an empty queue
    pub fn new(direction: QueueDirection) -> Self {
        Self {
            direction,
            pending: VecDeque::new(),
        }
    }

    /// Direction served by this queue
    pub fn direction(&self) -> QueueDirection {
        self.direction
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, token: u64) {
        self.pending.push_back(token);
    }

    /// Number of outstanding operations
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// `true` when nothing is outstanding
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Destroy the queue, returning the operations that were still outstanding
    pub fn destroy(mut self) -> Vec<u64> {
        let cancelled: Vec<u64> = self.pending.drain(..).collect();
        if !cancelled.is_empty() {
            debug!(direction = ?self.direction, count = cancelled.len(), "cancelled queued operations");
        }
        cancelled
    }
}

/// The read and write queues of an overlapped socket
#[derive(Debug)]
pub struct AsyncQueues {
    /// Overlapped reads
    pub read: AsyncQueue,
    /// Overlapped writes
    pub write: AsyncQueue,
}

impl AsyncQueues {
    /// Create both queues
    pub fn new() -> Self {
        Self {
            read: AsyncQueue::new(QueueDirection::Read),
            write: AsyncQueue::new(QueueDirection::Write),
        }
    }

    /// Destroy both queues
    ///
    /// # Returns
    ///
    /// Number of operations cancelled
    pub fn destroy(self) -> usize {
        self.read.destroy().len() + self.write.destroy().len()
    }
}

impl Default for AsyncQueues {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_push_and_destroy() {
        let mut queue = AsyncQueue::new(QueueDirection::Read);
        assert!(queue.is_empty());

        queue.push(7);
        queue.push(9);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.direction(), QueueDirection::Read);
        assert_eq!(queue.destroy(), vec![7, 9]);
    }

    #[test]
    fn test_queues_destroy_counts_both_directions() {
        let mut queues = AsyncQueues::new();
        queues.read.push(1);
        queues.write.push(2);
        queues.write.push(3);
        assert_eq!(queues.destroy(), 3);
    }
}
