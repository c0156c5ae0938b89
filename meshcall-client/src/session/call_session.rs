use crate::config::CallConfig;
use crate::error::{CallError, NegotiationError, ScreenShareError, SignalingTransportError};
use crate::media::{LocalMediaSource, MediaDevices};
use crate::peer::{OpResult, PeerConnectionManager, PeerEffect, PeerRole};
use crate::registry::{Participant, ParticipantRegistry, ParticipantUpdate};
use crate::session::session_command::{MediaEvent, SessionCommand};
use crate::session::{CallHandle, CallObserver, CallState, NoopObserver, SignalingStatus};
use crate::signaling::{SignalingClient, SignalingEvent, SignalingOutput};
use crate::transport::{TransportEvent, TransportFactory};
use meshcall_core::{ParticipantInfo, PeerId, RoomId, ServerMessage, Signal, SignalEnvelope, UserId};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const TRANSPORT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub display_name: String,
}

impl JoinRequest {
    pub fn new(
        room_id: impl Into<RoomId>,
        user_id: impl Into<UserId>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Collaborators a call is built from.
pub struct CallDeps {
    pub devices: Arc<dyn MediaDevices>,
    pub transports: Arc<dyn TransportFactory>,
    pub signaling: Arc<dyn SignalingOutput>,
    pub signaling_events: mpsc::Receiver<SignalingEvent>,
    pub observer: Arc<dyn CallObserver>,
}

impl CallDeps {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        transports: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        signaling_events: mpsc::Receiver<SignalingEvent>,
    ) -> Self {
        Self {
            devices,
            transports,
            signaling,
            signaling_events,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observer = observer;
        self
    }
}

/// The call controller. Runs as a single event loop that owns the local
/// media, the peer connections and the participant registry; a
/// `CallHandle` talks to it over a command channel.
pub struct CallSession {
    config: CallConfig,
    request: JoinRequest,
    observer: Arc<dyn CallObserver>,
    signaling: SignalingClient,
    local: LocalMediaSource,
    peers: PeerConnectionManager,
    registry: ParticipantRegistry,
    screen_pending: bool,
    screen_listener: Option<JoinHandle<()>>,
    command_rx: mpsc::Receiver<SessionCommand>,
    signaling_rx: mpsc::Receiver<SignalingEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    outcome_rx: mpsc::UnboundedReceiver<OpResult>,
    media_tx: mpsc::UnboundedSender<MediaEvent>,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,
    state_tx: watch::Sender<CallState>,
    participants_tx: watch::Sender<Vec<Participant>>,
    status_tx: watch::Sender<SignalingStatus>,
    screen_tx: watch::Sender<bool>,
}

impl CallSession {
    /// Acquires local media, announces the join and starts the session loop.
    ///
    /// Only a media failure fails the join, and then nothing is sent. A
    /// failed `call:join` leaves media running with the signaling status
    /// `Disconnected`; `CallHandle::rejoin` retries it.
    pub async fn join(
        config: CallConfig,
        deps: CallDeps,
        request: JoinRequest,
    ) -> Result<CallHandle, CallError> {
        let CallDeps {
            devices,
            transports,
            signaling,
            signaling_events,
            observer,
        } = deps;

        let (state_tx, state_rx) = watch::channel(CallState::Initializing);
        observer.on_state_changed(CallState::Initializing).await;

        let mut local = LocalMediaSource::new(devices);
        let stream = match local.acquire(&config.media).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Local media unavailable, aborting join: {}", e);
                let error = CallError::from(e);
                observer.on_error(&error).await;
                return Err(error);
            }
        };

        state_tx.send_replace(CallState::MediaReady);
        observer.on_state_changed(CallState::MediaReady).await;

        let signaling = SignalingClient::new(
            signaling,
            request.room_id.clone(),
            request.user_id.clone(),
        );
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let peers = PeerConnectionManager::new(
            transports,
            signaling.clone(),
            transport_tx,
            outcome_tx,
        );

        let status = match signaling.join(&request.display_name).await {
            Ok(()) => SignalingStatus::Connected,
            Err(e) => {
                warn!("call:join for {} not delivered: {}", request.room_id, e);
                observer.on_error(&CallError::from(e)).await;
                observer
                    .on_signaling_status(SignalingStatus::Disconnected)
                    .await;
                SignalingStatus::Disconnected
            }
        };

        let (participants_tx, participants_rx) = watch::channel(Vec::new());
        let (status_tx, status_rx) = watch::channel(status);
        let (screen_tx, screen_rx) = watch::channel(false);

        let session = Self {
            config,
            request,
            observer,
            signaling,
            local,
            peers,
            registry: ParticipantRegistry::new(),
            screen_pending: false,
            screen_listener: None,
            command_rx,
            signaling_rx: signaling_events,
            transport_rx,
            outcome_rx,
            media_tx,
            media_rx,
            state_tx,
            participants_tx,
            status_tx,
            screen_tx,
        };

        session.set_state(CallState::Joined).await;
        info!(
            "Joined room {} as {} ({})",
            session.request.room_id, session.request.user_id, session.request.display_name
        );

        let handle = CallHandle::new(
            command_tx,
            stream,
            state_rx,
            participants_rx,
            status_rx,
            screen_rx,
        );
        tokio::spawn(session.run());
        Ok(handle)
    }

    async fn run(mut self) {
        info!("Call session loop started");

        while self.state().is_active() {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(c) => self.handle_command(c).await,
                    None => {
                        info!("All call handles dropped. Leaving.");
                        self.teardown().await;
                    }
                },

                evt = self.signaling_rx.recv() => match evt {
                    Some(e) => self.handle_signaling_event(e).await,
                    None => {
                        error!("Signaling channel closed for good. Leaving.");
                        self.teardown().await;
                    }
                },

                Some(result) = self.outcome_rx.recv() => {
                    let effect = self.peers.handle_outcome(result).await;
                    self.apply_effect(effect).await;
                }

                Some(event) = self.transport_rx.recv() => {
                    let effect = self.peers.handle_transport_event(event).await;
                    self.apply_effect(effect).await;
                }

                Some(event) = self.media_rx.recv() => self.handle_media_event(event).await,
            }
        }

        // Captures still in flight or queued must not outlive the call.
        self.media_rx.close();
        while let Ok(event) = self.media_rx.try_recv() {
            self.handle_media_event(event).await;
        }

        info!("Call session loop finished");
    }

    fn state(&self) -> CallState {
        *self.state_tx.borrow()
    }

    async fn set_state(&self, state: CallState) {
        self.state_tx.send_replace(state);
        info!("Call state: {}", state);
        self.observer.on_state_changed(state).await;
    }

    /// Returns true when the status actually changed.
    async fn set_signaling_status(&self, status: SignalingStatus) -> bool {
        if self.status_tx.send_replace(status) == status {
            return false;
        }
        self.observer.on_signaling_status(status).await;
        true
    }

    async fn set_screen_sharing(&self, active: bool) {
        if self.screen_tx.send_replace(active) != active {
            self.observer.on_screen_share(active).await;
        }
    }

    async fn publish_participants(&self) {
        let snapshot = self.registry.snapshot();
        if *self.participants_tx.borrow() == snapshot {
            return;
        }
        self.participants_tx.send_replace(snapshot.clone());
        self.observer.on_participants(&snapshot).await;
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::StartScreenShare(reply) => {
                if let Some(track) = self.local.screen_track() {
                    let _ = reply.send(Ok(track.clone()));
                    return;
                }
                if self.screen_pending {
                    let _ = reply.send(Err(ScreenShareError::AlreadyInProgress.into()));
                    return;
                }

                self.screen_pending = true;
                let capture = self.local.display_capture();
                let media_tx = self.media_tx.clone();
                tokio::spawn(async move {
                    let result = capture.await.map_err(CallError::from);
                    let event = MediaEvent::ScreenCaptured { result, reply };
                    if let Err(mpsc::error::SendError(MediaEvent::ScreenCaptured {
                        result: Ok(track),
                        ..
                    })) = media_tx.send(event)
                    {
                        debug!("Call ended during screen capture, stopping {}", track.id());
                        track.stop();
                    }
                });
            }

            SessionCommand::StopScreenShare(reply) => {
                self.stop_screen_share().await;
                let _ = reply.send(());
            }

            SessionCommand::Rejoin(reply) => {
                info!("Re-sending call:join for {}", self.request.room_id);
                let result = self
                    .signaling
                    .join(&self.request.display_name)
                    .await
                    .map_err(CallError::from);
                if result.is_ok() {
                    self.set_signaling_status(SignalingStatus::Connected).await;
                }
                let _ = reply.send(result);
            }

            SessionCommand::Peers(reply) => {
                let _ = reply.send(self.peers.snapshot());
            }

            SessionCommand::Leave(reply) => {
                self.teardown().await;
                let _ = reply.send(());
            }
        }
    }

    async fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::ScreenCaptured { result, reply } => {
                self.screen_pending = false;

                let track = match result {
                    Ok(track) => track,
                    Err(e) => {
                        warn!("Screen share not started: {}", e);
                        self.observer.on_error(&e).await;
                        let _ = reply.send(Err(e));
                        return;
                    }
                };

                if !self.state().is_active() {
                    track.stop();
                    let _ = reply.send(Err(CallError::SessionClosed));
                    return;
                }

                if let Err(e) = self.local.attach_screen(track.clone()) {
                    let error = CallError::from(e);
                    self.observer.on_error(&error).await;
                    let _ = reply.send(Err(error));
                    return;
                }

                let switched = self.peers.set_outbound_video(track.clone());
                info!(
                    "Screen share started, {} connections switched now",
                    switched
                );

                let media_tx = self.media_tx.clone();
                let track_id = track.id().to_owned();
                self.screen_listener = Some(track.on_ended(move || {
                    let _ = media_tx.send(MediaEvent::ScreenEnded(track_id));
                }));

                self.set_screen_sharing(true).await;
                let _ = reply.send(Ok(track));
            }

            MediaEvent::ScreenEnded(track_id) => {
                if self.local.screen_track().is_some_and(|t| t.id() == track_id) {
                    info!("Screen track ended outside the call, reverting to camera");
                    self.stop_screen_share().await;
                }
            }
        }
    }

    async fn stop_screen_share(&mut self) {
        if let Some(listener) = self.screen_listener.take() {
            listener.abort();
        }
        let Some(camera) = self.local.stop_screen_share() else {
            return;
        };

        let switched = self.peers.set_outbound_video(camera);
        info!(
            "Screen share stopped, {} connections switched back now",
            switched
        );
        self.set_screen_sharing(false).await;
    }

    async fn handle_signaling_event(&mut self, event: SignalingEvent) {
        match event {
            SignalingEvent::Message(message) => {
                self.handle_server_message(message).await;
                self.publish_participants().await;
            }
            SignalingEvent::Disconnected => {
                warn!("Signaling disconnected; existing peers keep running");
                if self.set_signaling_status(SignalingStatus::Disconnected).await {
                    self.observer
                        .on_error(&SignalingTransportError::Disconnected.into())
                        .await;
                }
            }
            SignalingEvent::Reconnected => {
                info!("Signaling reconnected");
                self.set_signaling_status(SignalingStatus::Connected).await;
            }
        }
    }

    async fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Participants { participants } => {
                info!("Roster received with {} entries", participants.len());
                let role = self.config.offer_policy.roster_role();
                for info in participants {
                    self.admit(info, role).await;
                }
            }

            ServerMessage::ParticipantJoined(info) => {
                info!("Participant joined: {} ({})", info.socket_id, info.user_id);
                let role = self.config.offer_policy.newcomer_role();
                self.admit(info, role).await;
            }

            ServerMessage::ParticipantLeft { user_id, socket_id } => {
                let peer_id =
                    socket_id.or_else(|| self.registry.find_by_user(&user_id).cloned());
                match peer_id {
                    Some(peer_id) => self.depart(&peer_id).await,
                    None => debug!("Departure of unknown user {}", user_id),
                }
            }

            ServerMessage::Signal(envelope) => self.handle_signal(envelope).await,

            ServerMessage::Error { message } => {
                warn!("Signaling server rejected the request: {}", message);
                self.observer
                    .on_error(&CallError::JoinRejected(message))
                    .await;
            }
        }
    }

    fn has_capacity(&self) -> bool {
        self.registry.len() + 1 < self.config.max_participants
    }

    /// Registers an announced participant and opens its connection.
    async fn admit(&mut self, info: ParticipantInfo, role: PeerRole) {
        if info.user_id == self.request.user_id {
            debug!("Skipping own roster entry {}", info.socket_id);
            return;
        }

        let peer_id = info.socket_id.clone();
        if self.registry.contains(&peer_id) {
            self.registry.upsert(&peer_id, ParticipantUpdate::from(&info));
            return;
        }
        if !self.has_capacity() {
            warn!(
                "Room is at capacity ({}), not connecting to {}",
                self.config.max_participants, peer_id
            );
            return;
        }

        self.registry.upsert(&peer_id, ParticipantUpdate::from(&info));
        let tracks = self.local.outbound_tracks();
        if let Err(e) = self.peers.connect_peer(&peer_id, role, &tracks).await {
            self.fail_peer(e).await;
        }
    }

    async fn depart(&mut self, peer_id: &PeerId) {
        let removed = self.registry.remove(peer_id).is_some();
        let closed = self.peers.remove_connection(peer_id).await;
        if removed || closed {
            info!("Participant {} left", peer_id);
        }
    }

    async fn handle_signal(&mut self, envelope: SignalEnvelope) {
        let Some(sender) = envelope.sender_id else {
            warn!("Dropping {} signal without senderId", envelope.signal.kind());
            return;
        };
        if let Some(room_id) = &envelope.room_id
            && room_id != self.signaling.room_id()
        {
            warn!("Dropping signal from {} for room {}", sender, room_id);
            return;
        }

        match envelope.signal {
            Signal::Offer { offer } => {
                if !self.registry.contains(&sender) {
                    if !self.has_capacity() {
                        warn!("Room is at capacity, ignoring offer from {}", sender);
                        return;
                    }
                    self.registry.upsert(&sender, ParticipantUpdate::default());
                }
                let tracks = self.local.outbound_tracks();
                if let Err(e) = self.peers.handle_offer(&sender, offer, &tracks).await {
                    self.fail_peer(e).await;
                }
            }
            Signal::Answer { answer } => self.peers.handle_answer(&sender, answer),
            Signal::IceCandidate { candidate } => self.peers.handle_candidate(&sender, candidate),
        }
    }

    async fn apply_effect(&mut self, effect: Option<PeerEffect>) {
        let Some(effect) = effect else {
            return;
        };

        match effect {
            PeerEffect::Failed(error) => self.fail_peer(error).await,
            PeerEffect::RemoteTrack(peer_id, track) => {
                info!("Remote {:?} track {} from {}", track.kind, track.id, peer_id);
                self.registry
                    .upsert(&peer_id, ParticipantUpdate::track(track));
            }
            PeerEffect::SignalFailed(error) => {
                if self.set_signaling_status(SignalingStatus::Disconnected).await {
                    self.observer.on_error(&error.into()).await;
                }
            }
        }
        self.publish_participants().await;
    }

    /// Drops a peer after a negotiation failure. Other peers are untouched.
    async fn fail_peer(&mut self, error: NegotiationError) {
        warn!("Dropping participant {}: {}", error.peer_id, error);
        self.registry.remove(&error.peer_id);
        self.peers.remove_connection(&error.peer_id).await;
        self.observer.on_error(&CallError::Negotiation(error)).await;
        self.publish_participants().await;
    }

    /// Stops local media, closes every connection, clears the registry and
    /// sends `call:leave`. Runs at most once.
    async fn teardown(&mut self) {
        if !self.state().is_active() {
            return;
        }
        self.set_state(CallState::Leaving).await;

        if let Some(listener) = self.screen_listener.take() {
            listener.abort();
        }
        self.local.release();
        self.peers.close_all().await;
        self.registry.clear();
        self.publish_participants().await;
        self.set_screen_sharing(false).await;

        if let Err(e) = self.signaling.leave().await {
            debug!("call:leave not delivered: {}", e);
        }

        self.set_state(CallState::Left).await;
    }
}
