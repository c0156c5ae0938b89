use crate::error::NegotiationStage;
use crate::media::{MediaTrack, RemoteTrack, TrackKind};
use crate::peer::{InvalidTransition, NegotiationEvent, NegotiationState};
use crate::transport::{ConnectionId, PeerTransport};
use meshcall_core::{IceCandidate, PeerId, SdpType, SessionDescription};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerRole {
    /// Creates the offer.
    Initiator,
    /// Waits for the remote offer and answers it.
    Responder,
}

/// Transport operation, applied by the peer's worker strictly in queue order.
#[derive(Debug)]
pub(crate) enum PeerOp {
    AttachTracks(Vec<MediaTrack>),
    CreateOffer,
    CreateAnswer,
    SetRemoteDescription(SessionDescription),
    AddIceCandidate(IceCandidate),
    ReplaceVideo(MediaTrack),
}

#[derive(Debug, Clone)]
pub enum PeerOutcome {
    TracksAttached(usize),
    OfferCreated(SessionDescription),
    AnswerCreated(SessionDescription),
    RemoteDescriptionApplied(SdpType),
    CandidateApplied,
    VideoReplaced(String),
    /// Track substitution failed. The connection keeps its previous video.
    ReplaceFailed(String),
    /// The worker stopped. The connection has to be torn down.
    Failed {
        stage: NegotiationStage,
        reason: String,
    },
}

/// Completion of one `PeerOp`, tagged with the connection that ran it.
#[derive(Debug, Clone)]
pub struct OpResult {
    pub peer_id: PeerId,
    pub connection_id: ConnectionId,
    pub outcome: PeerOutcome,
}

/// Read-only view of a connection for callers outside the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshot {
    pub peer_id: PeerId,
    pub connection_id: ConnectionId,
    pub role: PeerRole,
    pub state: NegotiationState,
    pub local_tracks: Vec<String>,
    pub outbound_video: Option<String>,
    pub remote_tracks: Vec<RemoteTrack>,
    pub queued_candidates: usize,
}

pub struct PeerConnection {
    peer_id: PeerId,
    connection_id: ConnectionId,
    role: PeerRole,
    state: NegotiationState,
    transport: Arc<dyn PeerTransport>,
    ops: mpsc::UnboundedSender<PeerOp>,
    worker: JoinHandle<()>,
    local_tracks: Vec<MediaTrack>,
    outbound_video: Option<MediaTrack>,
    remote_tracks: Vec<RemoteTrack>,
    remote_description_requested: bool,
    ice_queue: VecDeque<IceCandidate>,
}

impl PeerConnection {
    pub(crate) fn spawn(
        peer_id: PeerId,
        connection_id: ConnectionId,
        role: PeerRole,
        transport: Arc<dyn PeerTransport>,
        outcomes: mpsc::UnboundedSender<OpResult>,
    ) -> Self {
        let (ops, ops_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(
            peer_id.clone(),
            connection_id,
            transport.clone(),
            ops_rx,
            outcomes,
        ));

        Self {
            peer_id,
            connection_id,
            role,
            state: NegotiationState::Idle,
            transport,
            ops,
            worker,
            local_tracks: Vec::new(),
            outbound_video: None,
            remote_tracks: Vec::new(),
            remote_description_requested: false,
            ice_queue: VecDeque::new(),
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub(crate) fn transition(
        &mut self,
        event: NegotiationEvent,
    ) -> Result<NegotiationState, InvalidTransition> {
        let next = self.state.next(event)?;
        debug!(
            "Peer {} {}: {} -> {}",
            self.peer_id, self.connection_id, self.state, next
        );
        self.state = next;
        Ok(next)
    }

    fn enqueue(&self, op: PeerOp) {
        if self.ops.send(op).is_err() {
            debug!(
                "Worker for {} {} has stopped, dropping op",
                self.peer_id, self.connection_id
            );
        }
    }

    pub(crate) fn attach(&mut self, tracks: Vec<MediaTrack>) {
        if let Some(video) = tracks.iter().find(|t| t.kind() == TrackKind::Video) {
            self.outbound_video = Some(video.clone());
        }
        self.local_tracks.extend(tracks.iter().cloned());
        self.enqueue(PeerOp::AttachTracks(tracks));
    }

    pub(crate) fn create_offer(&self) {
        self.enqueue(PeerOp::CreateOffer);
    }

    pub(crate) fn create_answer(&self) {
        self.enqueue(PeerOp::CreateAnswer);
    }

    pub(crate) fn remote_description_requested(&self) -> bool {
        self.remote_description_requested
    }

    /// Queues the remote description, then every buffered candidate behind it.
    pub(crate) fn set_remote_description(&mut self, description: SessionDescription) {
        self.remote_description_requested = true;
        self.enqueue(PeerOp::SetRemoteDescription(description));

        if !self.ice_queue.is_empty() {
            debug!(
                "Flushing {} queued candidates for {}",
                self.ice_queue.len(),
                self.peer_id
            );
        }
        while let Some(candidate) = self.ice_queue.pop_front() {
            self.enqueue(PeerOp::AddIceCandidate(candidate));
        }
    }

    /// Candidates before the remote description are held back. The worker
    /// queue orders everything after it.
    pub(crate) fn add_candidate(&mut self, candidate: IceCandidate) {
        if self.remote_description_requested {
            self.enqueue(PeerOp::AddIceCandidate(candidate));
        } else {
            self.ice_queue.push_back(candidate);
        }
    }

    /// Points the outbound video sender at `target` once the connection is
    /// stable. Returns true when a replacement was queued.
    pub(crate) fn sync_video(&mut self, target: &MediaTrack) -> bool {
        if !self.state.is_stable() || self.outbound_video.as_ref() == Some(target) {
            return false;
        }
        self.outbound_video = Some(target.clone());
        self.enqueue(PeerOp::ReplaceVideo(target.clone()));
        true
    }

    pub(crate) fn push_remote_track(&mut self, track: RemoteTrack) {
        self.remote_tracks.retain(|t| t.id != track.id);
        self.remote_tracks.push(track);
    }

    pub fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot {
            peer_id: self.peer_id.clone(),
            connection_id: self.connection_id,
            role: self.role,
            state: self.state,
            local_tracks: self.local_tracks.iter().map(|t| t.id().to_owned()).collect(),
            outbound_video: self.outbound_video.as_ref().map(|t| t.id().to_owned()),
            remote_tracks: self.remote_tracks.clone(),
            queued_candidates: self.ice_queue.len(),
        }
    }

    /// Abandons in-flight work and closes the transport.
    pub(crate) async fn close(mut self) {
        self.worker.abort();
        let _ = self.transition(NegotiationEvent::Close);
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport for {}: {:?}", self.peer_id, e);
        }
    }
}

async fn run_worker(
    peer_id: PeerId,
    connection_id: ConnectionId,
    transport: Arc<dyn PeerTransport>,
    mut ops: mpsc::UnboundedReceiver<PeerOp>,
    outcomes: mpsc::UnboundedSender<OpResult>,
) {
    while let Some(op) = ops.recv().await {
        let outcome = apply(transport.as_ref(), op).await;
        let failed = matches!(outcome, PeerOutcome::Failed { .. });

        let result = OpResult {
            peer_id: peer_id.clone(),
            connection_id,
            outcome,
        };
        if outcomes.send(result).is_err() || failed {
            break;
        }
    }

    debug!("Worker for {} {} finished", peer_id, connection_id);
}

async fn apply(transport: &dyn PeerTransport, op: PeerOp) -> PeerOutcome {
    let failed = |stage: NegotiationStage, e: anyhow::Error| PeerOutcome::Failed {
        stage,
        reason: format!("{e:#}"),
    };

    match op {
        PeerOp::AttachTracks(tracks) => {
            for track in &tracks {
                if let Err(e) = transport.add_track(track).await {
                    return failed(NegotiationStage::AttachTracks, e);
                }
            }
            PeerOutcome::TracksAttached(tracks.len())
        }
        PeerOp::CreateOffer => match transport.create_offer().await {
            Ok(offer) => PeerOutcome::OfferCreated(offer),
            Err(e) => failed(NegotiationStage::CreateOffer, e),
        },
        PeerOp::CreateAnswer => match transport.create_answer().await {
            Ok(answer) => PeerOutcome::AnswerCreated(answer),
            Err(e) => failed(NegotiationStage::CreateAnswer, e),
        },
        PeerOp::SetRemoteDescription(description) => {
            let sdp_type = description.sdp_type;
            match transport.set_remote_description(description).await {
                Ok(()) => PeerOutcome::RemoteDescriptionApplied(sdp_type),
                Err(e) => failed(NegotiationStage::SetRemoteDescription, e),
            }
        }
        PeerOp::AddIceCandidate(candidate) => match transport.add_ice_candidate(candidate).await {
            Ok(()) => PeerOutcome::CandidateApplied,
            Err(e) => failed(NegotiationStage::AddIceCandidate, e),
        },
        PeerOp::ReplaceVideo(track) => match transport.replace_video_track(&track).await {
            Ok(()) => PeerOutcome::VideoReplaced(track.id().to_owned()),
            Err(e) => PeerOutcome::ReplaceFailed(format!("{e:#}")),
        },
    }
}
