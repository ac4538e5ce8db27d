//! Use Cases Layer: Socket Event Multiplexing
//!
//! Translates the stateless readiness reported by a polling loop into the network
//! event model seen by clients: per-kind pending and held (latched) sets, per-kind
//! errors and a subscriber event signalled when a subscribed kind becomes pending.
//!
//! ## Overview
//!
//! - **[`interest`](interest/index.html)**: which conditions a socket asks the polling
//!   loop to watch, given its phase, subscription and held sets
//! - **[`record`](record/index.html)**: [`SocketRecord`], its lifecycle (create, accept,
//!   destroy) and the reselection step that keeps the polling loop in sync
//! - **[`transitions`](transitions/index.html)**: the readiness-to-event state machine
//! - **[`subscription`](subscription/index.html)**: the client-facing set / query /
//!   enable operations
//! - **[`collaborators`](collaborators/index.html)**: the traits through which the
//!   record reaches the descriptor, the polling loop and waitable events
//!
//! ## Concurrency
//!
//! A record is mutated only by one request or one readiness callback at a time; the
//! surrounding dispatcher serializes access. Nothing here blocks: the descriptor is
//! non-blocking and the readiness probe has a zero timeout.

pub mod async_queue;
pub mod collaborators;
pub mod config;
pub mod interest;
pub mod record;
pub mod subscription;
pub mod transitions;
pub mod wait_queue;

#[cfg(test)]
mod testing;

pub use async_queue::{AsyncQueue, AsyncQueues, QueueDirection};
pub use collaborators::{PollRegistry, SharedEvent, SocketDescriptor, Waitable};
pub use config::{HangupPeek, SocketEventConfig};
pub use interest::compute_interest;
pub use record::{FileInfo, FileType, Registration, SocketRecord};
pub use subscription::{ServiceQuery, SocketEventInfo};
pub use wait_queue::WaitQueue;
