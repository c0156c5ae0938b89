use crate::error::{NegotiationError, NegotiationStage, SignalingTransportError};
use crate::media::{MediaTrack, RemoteTrack};
use crate::peer::{
    NegotiationEvent, NegotiationState, OpResult, PeerConnection, PeerOutcome, PeerRole,
    PeerSnapshot,
};
use crate::signaling::SignalingClient;
use crate::transport::{ConnectionId, TransportEvent, TransportFactory};
use futures::future::join_all;
use meshcall_core::{IceCandidate, PeerId, SdpType, SessionDescription, Signal};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Candidates kept per peer we have no connection for yet.
const MAX_ORPHAN_CANDIDATES: usize = 64;

/// What the session has to act on after the manager handled an event.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEffect {
    /// The connection was torn down. Its participant has to go as well.
    Failed(NegotiationError),
    RemoteTrack(PeerId, RemoteTrack),
    SignalFailed(SignalingTransportError),
}

/// Owns one connection per remote peer and drives its offer/answer/ICE
/// exchange. Transport calls run on per-peer workers; their results come
/// back through the outcome channel and are fed to `handle_outcome`.
pub struct PeerConnectionManager {
    factory: Arc<dyn TransportFactory>,
    signaling: SignalingClient,
    connections: HashMap<PeerId, PeerConnection>,
    orphan_candidates: HashMap<PeerId, VecDeque<IceCandidate>>,
    outbound_video: Option<MediaTrack>,
    next_connection: u64,
    transport_tx: mpsc::Sender<TransportEvent>,
    outcome_tx: mpsc::UnboundedSender<OpResult>,
}

impl PeerConnectionManager {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        signaling: SignalingClient,
        transport_tx: mpsc::Sender<TransportEvent>,
        outcome_tx: mpsc::UnboundedSender<OpResult>,
    ) -> Self {
        Self {
            factory,
            signaling,
            connections: HashMap::new(),
            orphan_candidates: HashMap::new(),
            outbound_video: None,
            next_connection: 0,
            transport_tx,
            outcome_tx,
        }
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.connections.contains_key(peer_id)
    }

    pub fn state(&self, peer_id: &PeerId) -> Option<NegotiationState> {
        self.connections.get(peer_id).map(|c| c.state())
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<_> = self.connections.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn snapshot(&self) -> Vec<PeerSnapshot> {
        let mut peers: Vec<_> = self.connections.values().map(|c| c.snapshot()).collect();
        peers.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        peers
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Opens a connection to `peer_id` sending `tracks`. An initiator queues
    /// its offer right away. An existing connection to the peer is replaced.
    pub async fn connect_peer(
        &mut self,
        peer_id: &PeerId,
        role: PeerRole,
        tracks: &[MediaTrack],
    ) -> Result<ConnectionId, NegotiationError> {
        if self.connections.contains_key(peer_id) {
            info!("Replacing existing connection to {}", peer_id);
            if let Some(previous) = self.connections.remove(peer_id) {
                previous.close().await;
            }
        }

        self.next_connection += 1;
        let connection_id = ConnectionId(self.next_connection);

        let transport = self
            .factory
            .create(peer_id.clone(), connection_id, self.transport_tx.clone())
            .await
            .map_err(|e| {
                NegotiationError::new(peer_id.clone(), NegotiationStage::Connect, format!("{e:#}"))
            })?;

        let mut connection = PeerConnection::spawn(
            peer_id.clone(),
            connection_id,
            role,
            transport,
            self.outcome_tx.clone(),
        );
        connection.attach(tracks.to_vec());

        if let Some(orphans) = self.orphan_candidates.remove(peer_id) {
            debug!("Adopting {} early candidates for {}", orphans.len(), peer_id);
            for candidate in orphans {
                connection.add_candidate(candidate);
            }
        }

        if role == PeerRole::Initiator {
            connection.create_offer();
        }

        info!(
            "Connection {} to {} opened as {:?}",
            connection_id, peer_id, role
        );
        self.connections.insert(peer_id.clone(), connection);
        Ok(connection_id)
    }

    /// Answers a remote offer, opening a responder connection if needed.
    pub async fn handle_offer(
        &mut self,
        peer_id: &PeerId,
        offer: SessionDescription,
        tracks: &[MediaTrack],
    ) -> Result<(), NegotiationError> {
        let initiator = self
            .connections
            .get(peer_id)
            .is_some_and(|c| c.role() == PeerRole::Initiator);
        let needs_connection = match self.state(peer_id) {
            None => true,
            Some(NegotiationState::Idle) if !initiator => false,
            Some(NegotiationState::Idle | NegotiationState::OfferSent) => {
                warn!(
                    "Offer collision with {}; keeping the local offer",
                    peer_id
                );
                return Ok(());
            }
            Some(state) => {
                info!("New offer from {} while {}; renegotiating", peer_id, state);
                true
            }
        };

        if needs_connection {
            self.connect_peer(peer_id, PeerRole::Responder, tracks).await?;
        }

        let Some(connection) = self.connections.get_mut(peer_id) else {
            return Ok(());
        };
        if let Err(e) = connection.transition(NegotiationEvent::RemoteOfferReceived) {
            warn!("Dropping offer from {}: {}", peer_id, e);
            return Ok(());
        }
        connection.set_remote_description(offer);
        connection.create_answer();
        Ok(())
    }

    pub fn handle_answer(&mut self, peer_id: &PeerId, answer: SessionDescription) {
        let Some(connection) = self.connections.get_mut(peer_id) else {
            warn!("Answer from unknown peer {}", peer_id);
            return;
        };
        if connection.state() != NegotiationState::OfferSent
            || connection.remote_description_requested()
        {
            warn!(
                "Ignoring unexpected answer from {} in state {}",
                peer_id,
                connection.state()
            );
            return;
        }
        connection.set_remote_description(answer);
    }

    /// Applies or buffers a remote candidate. Candidates for a peer we do not
    /// know yet are kept until its connection opens.
    pub fn handle_candidate(&mut self, peer_id: &PeerId, candidate: IceCandidate) {
        if let Some(connection) = self.connections.get_mut(peer_id) {
            connection.add_candidate(candidate);
            return;
        }

        let orphans = self.orphan_candidates.entry(peer_id.clone()).or_default();
        if orphans.len() >= MAX_ORPHAN_CANDIDATES {
            warn!("Too many early candidates from {}, dropping", peer_id);
            return;
        }
        orphans.push_back(candidate);
    }

    /// Feeds back a worker result. Results from a connection that has been
    /// replaced or closed in the meantime are discarded.
    pub async fn handle_outcome(&mut self, result: OpResult) -> Option<PeerEffect> {
        let OpResult {
            peer_id,
            connection_id,
            outcome,
        } = result;

        let Some(connection) = self
            .connections
            .get_mut(&peer_id)
            .filter(|c| c.connection_id() == connection_id)
        else {
            debug!(
                "Discarding {:?} from stale connection {} {}",
                outcome, peer_id, connection_id
            );
            return None;
        };

        match outcome {
            PeerOutcome::TracksAttached(count) => {
                debug!("Attached {} local tracks to {}", count, peer_id);
                None
            }
            PeerOutcome::OfferCreated(offer) => {
                if let Err(e) = connection.transition(NegotiationEvent::LocalOfferCreated) {
                    warn!("Discarding offer for {}: {}", peer_id, e);
                    return None;
                }
                self.transmit(&peer_id, Signal::Offer { offer }).await
            }
            PeerOutcome::AnswerCreated(answer) => {
                if let Err(e) = connection.transition(NegotiationEvent::LocalAnswerCreated) {
                    warn!("Discarding answer for {}: {}", peer_id, e);
                    return None;
                }
                if let Some(effect) = self.transmit(&peer_id, Signal::Answer { answer }).await {
                    return Some(effect);
                }
                self.mark_stable(&peer_id, NegotiationEvent::AnswerTransmitted);
                None
            }
            PeerOutcome::RemoteDescriptionApplied(SdpType::Answer) => {
                self.mark_stable(&peer_id, NegotiationEvent::RemoteAnswerApplied);
                None
            }
            PeerOutcome::RemoteDescriptionApplied(sdp_type) => {
                debug!("Remote {:?} applied for {}", sdp_type, peer_id);
                None
            }
            PeerOutcome::CandidateApplied => {
                debug!("Candidate applied for {}", peer_id);
                None
            }
            PeerOutcome::VideoReplaced(track_id) => {
                info!("Outbound video for {} now {}", peer_id, track_id);
                None
            }
            PeerOutcome::ReplaceFailed(reason) => {
                warn!("Track substitution failed for {}: {}", peer_id, reason);
                None
            }
            PeerOutcome::Failed { stage, reason } => {
                let error = NegotiationError::new(peer_id.clone(), stage, reason);
                error!("{}", error);
                self.remove_connection(&peer_id).await;
                Some(PeerEffect::Failed(error))
            }
        }
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) -> Option<PeerEffect> {
        match event {
            TransportEvent::CandidateGenerated(peer_id, connection_id, candidate) => {
                if !self.is_current(&peer_id, connection_id) {
                    return None;
                }
                self.transmit(&peer_id, Signal::IceCandidate { candidate })
                    .await
            }
            TransportEvent::RemoteTrack(peer_id, connection_id, track) => {
                let connection = self
                    .connections
                    .get_mut(&peer_id)
                    .filter(|c| c.connection_id() == connection_id)?;
                connection.push_remote_track(track.clone());
                Some(PeerEffect::RemoteTrack(peer_id, track))
            }
            TransportEvent::Failed(peer_id, connection_id) => {
                if !self.is_current(&peer_id, connection_id) {
                    return None;
                }
                let error = NegotiationError::new(
                    peer_id.clone(),
                    NegotiationStage::Transport,
                    "peer connection failed",
                );
                error!("{}", error);
                self.remove_connection(&peer_id).await;
                Some(PeerEffect::Failed(error))
            }
        }
    }

    /// Makes `track` the outbound video of every connection. Stable
    /// connections switch now, the rest switch once they become stable.
    /// Returns how many substitutions were queued.
    pub fn set_outbound_video(&mut self, track: MediaTrack) -> usize {
        let mut replaced = 0;
        for connection in self.connections.values_mut() {
            if connection.sync_video(&track) {
                replaced += 1;
            } else if !connection.state().is_stable() {
                debug!(
                    "Deferring video substitution for {} until stable",
                    connection.peer_id()
                );
            }
        }
        self.outbound_video = Some(track);
        replaced
    }

    /// Closes the connection to `peer_id`. Returns false if there was none.
    pub async fn remove_connection(&mut self, peer_id: &PeerId) -> bool {
        self.orphan_candidates.remove(peer_id);
        let Some(connection) = self.connections.remove(peer_id) else {
            return false;
        };
        connection.close().await;
        info!("Connection to {} closed", peer_id);
        true
    }

    pub async fn close_all(&mut self) {
        self.orphan_candidates.clear();
        let connections: Vec<_> = self.connections.drain().map(|(_, c)| c).collect();
        if connections.is_empty() {
            return;
        }
        info!("Closing {} peer connections", connections.len());
        join_all(connections.into_iter().map(PeerConnection::close)).await;
    }

    fn is_current(&self, peer_id: &PeerId, connection_id: ConnectionId) -> bool {
        self.connections
            .get(peer_id)
            .is_some_and(|c| c.connection_id() == connection_id)
    }

    fn mark_stable(&mut self, peer_id: &PeerId, event: NegotiationEvent) {
        let Some(connection) = self.connections.get_mut(peer_id) else {
            return;
        };
        if let Err(e) = connection.transition(event) {
            warn!("{} for {}", e, peer_id);
            return;
        }
        info!("Connection to {} is stable", peer_id);

        if let Some(track) = &self.outbound_video {
            connection.sync_video(track);
        }
    }

    async fn transmit(&self, peer_id: &PeerId, signal: Signal) -> Option<PeerEffect> {
        match self.signaling.send_signal(peer_id, signal).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to send signal to {}: {}", peer_id, e);
                Some(PeerEffect::SignalFailed(e))
            }
        }
    }
}
