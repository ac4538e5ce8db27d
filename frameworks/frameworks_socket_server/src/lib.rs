//! Frameworks Layer: Socket Server
//!
//! Serves the socket requests clients send to the server process: create, accept,
//! set / get / enable the event subscription and file information. Sockets live
//! behind handles in a per-process handle table; readiness reported by the polling
//! loop is routed back to the owning socket record.
//!
//! ## Modules
//!
//! - **[`server`](server/index.html)**: [`SocketServer`], the request handlers and the
//!   dispatch sweep
//! - **[`descriptor`](descriptor/index.html)**: [`ServerSocket`], the native socket
//!   that reports its own release so the polling loop never watches a closed descriptor
//! - **[`handles`](handles/index.html)**: handle table, access rights, duplication and
//!   close
//! - **[`event`](event/index.html)**: waitable event objects handed to subscribers
//! - **[`config`](config/index.html)**: server configuration
//! - **[`error`](error/index.html)**: errors reported to clients
//!
//! ## Architecture
//!
//! This crate depends on the Entities, Use Cases and Adapters layers. Request
//! marshalling and the client side stay outside.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod handles;
pub mod server;

pub use config::ServerConfig;
pub use descriptor::ServerSocket;
pub use error::ServerError;
pub use event::Event;
pub use handles::{AccessRights, Handle, HandleTable, Object, SharedSocket};
pub use server::{
    AcceptSocketRequest, CreateSocketRequest, GetSocketEventRequest, SocketServer,
};
