//! Adapters Layer: Native Sockets
//!
//! Backs the socket record's descriptor collaborator with a real non-blocking socket
//! built on the `socket2` crate, and translates OS error numbers into the network
//! error namespace reported to clients.
//!
//! ## Overview
//!
//! - **[`socket`](socket/index.html)**: [`NativeSocket`], open / accept / zero-length
//!   peek / `SO_ERROR` / point-in-time readiness probe
//! - **[`errno`](errno/index.html)**: errno → [`NetError`](entities_socket_events::NetError)
//!
//! ## Architecture
//!
//! This crate is part of the adapters layer. It depends on:
//! - `entities_socket_events`: readiness, interest and error types
//! - `usecases_socket_events`: the `SocketDescriptor` trait it implements

pub mod errno;
pub mod socket;

pub use errno::{translate_errno, translate_io_error};
pub use socket::NativeSocket;
