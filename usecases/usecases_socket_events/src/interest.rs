//! Poll-Interest Calculation
//!
//! The phase always wins over the subscription: a connecting socket only waits for
//! writability (connect completion) and a listening socket only for readability
//! (incoming connection). Everything else is driven by what the subscriber asked
//! for, what the socket is capable of, and what has not already been delivered.

use entities_socket_events::{EventSet, Phase, PollInterest, SocketState, StateFlags};

/// Compute the conditions to register with the polling loop
///
/// # Arguments
///
/// * `state` - Current socket state
/// * `mask` - Subscription mask
/// * `held` - Kinds delivered and latched until acknowledged
///
/// # Returns
///
/// The poll interest for the descriptor
pub fn compute_interest(state: &SocketState, mask: EventSet, held: EventSet) -> PollInterest {
    match state.phase() {
        Phase::Connecting => PollInterest::WRITABLE,
        Phase::Listening => {
            if held.contains(EventSet::ACCEPT) {
                PollInterest::empty()
            } else {
                PollInterest::READABLE
            }
        }
        Phase::Normal => {
            let wanted = mask.difference(held);
            let mut interest = PollInterest::empty();
            if wanted.contains(EventSet::READ) && state.contains(StateFlags::READABLE) {
                interest |= PollInterest::READABLE;
                // Urgent data stays flagged until read, so a held OOB stops the watch
                if !held.contains(EventSet::OOB) {
                    interest |= PollInterest::PRIORITY;
                }
            }
            if wanted.contains(EventSet::WRITE) && state.contains(StateFlags::WRITABLE) {
                interest |= PollInterest::WRITABLE;
            }
            interest
        }
    }
}
