use meshcall_core::utils::DEFAULT_MAX_PARTICIPANTS;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Sockets admitted per room. Joins beyond it get `call:error`.
    pub max_participants: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        }
    }
}
