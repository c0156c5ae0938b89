use meshcall_core::PeerId;
use std::fmt;
use thiserror::Error;

/// Camera/microphone acquisition failure. Fatal to `join`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaAccessError {
    #[error("permission to capture camera/microphone was denied")]
    PermissionDenied,
    #[error("no capture device available")]
    NoDevice,
    #[error("capture device is busy")]
    DeviceBusy,
    #[error("media backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenShareError {
    #[error("screen share was cancelled")]
    Cancelled,
    #[error("screen capture is not supported")]
    NotSupported,
    #[error("a screen share request is already in progress")]
    AlreadyInProgress,
    #[error("screen capture failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStage {
    Connect,
    AttachTracks,
    CreateOffer,
    CreateAnswer,
    SetRemoteDescription,
    AddIceCandidate,
    Transport,
}

impl fmt::Display for NegotiationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::AttachTracks => "attach-tracks",
            Self::CreateOffer => "create-offer",
            Self::CreateAnswer => "create-answer",
            Self::SetRemoteDescription => "set-remote-description",
            Self::AddIceCandidate => "add-ice-candidate",
            Self::Transport => "transport",
        };
        f.write_str(name)
    }
}

/// Per-peer failure. The peer is torn down, the call continues for everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("negotiation with {peer_id} failed during {stage}: {reason}")]
pub struct NegotiationError {
    pub peer_id: PeerId,
    pub stage: NegotiationStage,
    pub reason: String,
}

impl NegotiationError {
    pub fn new(peer_id: PeerId, stage: NegotiationStage, reason: impl fmt::Display) -> Self {
        Self {
            peer_id,
            stage,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalingTransportError {
    #[error("signaling channel is disconnected")]
    Disconnected,
    #[error("failed to connect to signaling server: {0}")]
    Connect(String),
    #[error("failed to encode signaling message: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The call cannot proceed.
    Critical,
    /// The call continues, possibly degraded.
    Recoverable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error(transparent)]
    Media(#[from] MediaAccessError),
    #[error(transparent)]
    ScreenShare(#[from] ScreenShareError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Signaling(#[from] SignalingTransportError),
    #[error("join rejected by signaling server: {0}")]
    JoinRejected(String),
    #[error("call session is closed")]
    SessionClosed,
}

impl CallError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Media(_) | Self::SessionClosed => Severity::Critical,
            Self::ScreenShare(_)
            | Self::Negotiation(_)
            | Self::Signaling(_)
            | Self::JoinRejected(_) => Severity::Recoverable,
        }
    }
}
