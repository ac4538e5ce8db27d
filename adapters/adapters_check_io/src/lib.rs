//! Adapters Layer: Check I/O
//!
//! The central polling loop the socket records register with. It keeps the interest
//! of every registered descriptor, waits for readiness with `poll(2)` and hands each
//! `(descriptor, readiness)` pair back to the caller for dispatch.
//!
//! ## Modules
//!
//! - **[`check_io`](check_io/index.html)**: [`CheckIo`], the interest registry and
//!   the blocking sweep
//! - **[`pollset`](pollset/index.html)**: conversions between the poll bit sets and
//!   `poll(2)` flags, and the zero-timeout probe used by reselection
//!
//! ## See Also
//!
//! - [`adapters_socket`](../adapters_socket/index.html): the native socket that probes
//!   through this crate

pub mod check_io;
pub mod pollset;

pub use check_io::{CheckIo, CheckIoConfig, CheckIoError, CheckIoInfo, IoEvent};
pub use pollset::{interest_flags, probe_readiness, readiness_from_flags};
