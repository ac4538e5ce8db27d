//! Socket Creation Flags

use bitflags::bitflags;

bitflags! {
    /// Flags supplied when a socket is created
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CreateFlags: u32 {
        /// Overlapped mode: the socket owns asynchronous read and write queues
        const OVERLAPPED = 0x01;
    }
}
