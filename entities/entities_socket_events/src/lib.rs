//! Entities Layer: Socket Network Events
//!
//! Provides the data model shared by every layer of the socket event multiplexer:
//! the fixed universe of network event kinds, the socket state flags and their
//! phase invariants, the readiness and poll-interest bit sets exchanged with the
//! polling loop, and the network error namespace reported to clients.
//!
//! ## Overview
//!
//! The `entities_socket_events` crate is the innermost layer of the workspace. It has
//! no knowledge of descriptors, polling loops or handles; it only describes values:
//!
//! - **[`event_kind`](event_kind/index.html)**: [`EventKind`] and the tagged
//!   [`EventSet`] used for the subscription, held and pending masks
//! - **[`state`](state/index.html)**: [`SocketState`] with constructor-enforced
//!   phase invariants (never connecting and listening at once)
//! - **[`readiness`](readiness/index.html)**: raw [`Readiness`] reported by the
//!   polling loop and the [`PollInterest`] registered with it
//! - **[`net_error`](net_error/index.html)**: [`NetError`] codes and the per-kind
//!   [`ErrorSlots`]
//! - **[`flags`](flags/index.html)**: socket creation flags
//!
//! ## Wire compatibility
//!
//! Every bit set here keeps the numeric layout clients see on the wire, so
//! `EventSet::bits()` and `StateFlags::bits()` can be returned in replies as is.
//!
//! ## Usage
//!
//! ```rust
//! use entities_socket_events::{EventKind, EventSet, SocketState, Phase};
//!
//! let mask = EventSet::READ | EventSet::CLOSE;
//! assert!(mask.contains(EventKind::Read.set()));
//!
//! let state = SocketState::fresh(true);
//! assert_eq!(state.phase(), Phase::Normal);
//! ```

pub mod event_kind;
pub mod flags;
pub mod net_error;
pub mod readiness;
pub mod state;

pub use event_kind::{EventKind, EventSet, EVENT_ERROR_SLOTS};
pub use flags::CreateFlags;
pub use net_error::{ErrorSlots, NetError};
pub use readiness::{PollInterest, Readiness};
pub use state::{Phase, SocketState, StateError, StateFlags};
