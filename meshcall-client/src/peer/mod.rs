mod negotiation_state;
mod peer_connection;
mod peer_manager;

pub use negotiation_state::{InvalidTransition, NegotiationEvent, NegotiationState};
pub use peer_connection::{OpResult, PeerConnection, PeerOutcome, PeerRole, PeerSnapshot};
pub use peer_manager::{PeerConnectionManager, PeerEffect};
