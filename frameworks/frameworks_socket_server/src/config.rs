//! Server Configuration

use adapters_check_io::CheckIoConfig;
use usecases_socket_events::SocketEventConfig;

/// Socket server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Event configuration applied to every socket record
    pub socket: SocketEventConfig,
    /// Maximum number of open handles
    pub max_handles: usize,
    /// Polling loop configuration
    pub check_io: CheckIoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket: SocketEventConfig::default(),
            max_handles: 4096,
            check_io: CheckIoConfig::default(),
        }
    }
}
