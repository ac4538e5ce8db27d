//! Socket Event Configuration

/// Whether a readable notification is double-checked with a zero-length peek
///
/// Some kernels (Linux among them) do not report hang-up for a peer that closed only
/// its write side until the local side tries to read. With the peek enabled, a
/// readable notification whose peek returns end-of-stream is handled as a hang-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangupPeek {
    /// Peek on every readable notification in the data phase
    Enabled,
    /// Trust the polling loop's hang-up reporting
    Disabled,
}

impl HangupPeek {
    /// Policy for the host platform
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "linux", target_os = "android")) {
            HangupPeek::Enabled
        } else {
            HangupPeek::Disabled
        }
    }
}

/// Socket event configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketEventConfig {
    /// Half-close detection policy
    pub hangup_peek: HangupPeek,
}

impl SocketEventConfig {
    /// Configuration for the host platform
    pub fn new() -> Self {
        Self {
            hangup_peek: HangupPeek::platform_default(),
        }
    }

    /// Configuration with an explicit half-close policy
    pub fn with_hangup_peek(hangup_peek: HangupPeek) -> Self {
        Self { hangup_peek }
    }
}

impl Default for SocketEventConfig {
    fn default() -> Self {
        Self::new()
    }
}
