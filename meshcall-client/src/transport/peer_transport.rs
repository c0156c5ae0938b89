use crate::media::MediaTrack;
use crate::transport::{ConnectionId, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use meshcall_core::{IceCandidate, PeerId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One negotiated media connection to a remote participant.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Starts sending `track`. Called before the first offer/answer.
    async fn add_track(&self, track: &MediaTrack) -> Result<()>;

    /// Creates an offer and sets it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Creates an answer and sets it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Swaps the track feeding the outbound video sender in place.
    async fn replace_video_track(&self, track: &MediaTrack) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: PeerId,
        connection_id: ConnectionId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>>;
}
