mod message;
mod participant;
mod peer;
mod room;
mod signaling;
mod user;

pub use message::{ClientMessage, ServerMessage};
pub use participant::ParticipantInfo;
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{
    IceCandidate, IceServerConfig, SdpType, SessionDescription, Signal, SignalEnvelope,
};
pub use user::UserId;
