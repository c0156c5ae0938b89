use serde::Serialize;
use std::fmt;

/// Call lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallState {
    Initializing,
    MediaReady,
    Joined,
    Leaving,
    Left,
}

impl CallState {
    pub fn is_active(self) -> bool {
        self < Self::Leaving
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::MediaReady => "media-ready",
            Self::Joined => "joined",
            Self::Leaving => "leaving",
            Self::Left => "left",
        };
        f.write_str(name)
    }
}

/// Health of the signaling channel. Established peer connections keep
/// running while it is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalingStatus {
    Connected,
    Disconnected,
}
