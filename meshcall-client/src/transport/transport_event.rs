use crate::media::RemoteTrack;
use meshcall_core::{IceCandidate, PeerId};
use std::fmt;

/// Generation of a peer connection. Events from a connection that has since
/// been replaced or closed carry a stale id and are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events a transport raises for the session loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local ICE candidate to forward to the remote peer.
    CandidateGenerated(PeerId, ConnectionId, IceCandidate),

    /// The remote peer started sending a track.
    RemoteTrack(PeerId, ConnectionId, RemoteTrack),

    /// The connection failed and will not recover.
    Failed(PeerId, ConnectionId),
}
