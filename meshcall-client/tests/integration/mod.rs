pub mod media_tests;
pub mod negotiation_tests;

use meshcall_client::{
    CallConfig, CallDeps, CallError, CallHandle, CallSession, HeadlessDevices, JoinRequest,
    MediaDevices, NegotiationState, SignalingEvent,
};
use meshcall_core::{
    ParticipantInfo, PeerId, RoomId, ServerMessage, SessionDescription, Signal, SignalEnvelope,
    UserId,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use crate::utils::{
    MockSignalingOutput, MockTransportFactory, RecordingObserver, wait_for_peer_state,
};

pub const ROOM: &str = "R1";
pub const LOCAL_USER: i64 = 1;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A call joined as user 1 in room R1, wired to mocks.
pub struct TestCall {
    pub handle: CallHandle,
    pub signaling: MockSignalingOutput,
    pub events: mpsc::Sender<SignalingEvent>,
    pub transports: MockTransportFactory,
    pub observer: RecordingObserver,
}

pub struct TestCallBuilder {
    config: CallConfig,
    transports: MockTransportFactory,
    devices: Arc<dyn MediaDevices>,
    signaling: MockSignalingOutput,
}

impl TestCallBuilder {
    pub fn new() -> Self {
        Self {
            config: CallConfig::default(),
            transports: MockTransportFactory::new(),
            devices: Arc::new(HeadlessDevices::new().with_screen_capture()),
            signaling: MockSignalingOutput::new(),
        }
    }

    pub fn config(mut self, config: CallConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transports(mut self, transports: MockTransportFactory) -> Self {
        self.transports = transports;
        self
    }

    pub fn devices(mut self, devices: impl MediaDevices + 'static) -> Self {
        self.devices = Arc::new(devices);
        self
    }

    pub fn signaling(mut self, signaling: MockSignalingOutput) -> Self {
        self.signaling = signaling;
        self
    }

    pub async fn try_start(self) -> Result<TestCall, CallError> {
        let (events, events_rx) = mpsc::channel(64);
        let observer = RecordingObserver::new();

        let deps = CallDeps::new(
            self.devices,
            Arc::new(self.transports.clone()),
            Arc::new(self.signaling.clone()),
            events_rx,
        )
        .with_observer(Arc::new(observer.clone()));

        let handle = CallSession::join(
            self.config,
            deps,
            JoinRequest::new(ROOM, LOCAL_USER, "ana"),
        )
        .await?;

        Ok(TestCall {
            handle,
            signaling: self.signaling,
            events,
            transports: self.transports,
            observer,
        })
    }

    pub async fn start(self) -> TestCall {
        self.try_start().await.expect("Failed to join call")
    }
}

pub async fn create_test_call() -> TestCall {
    TestCallBuilder::new().start().await
}

pub fn participant(user: i64, socket: &str, name: &str) -> ParticipantInfo {
    ParticipantInfo::new(UserId::from(user), PeerId::from(socket), name)
}

impl TestCall {
    pub async fn deliver(&self, message: ServerMessage) {
        self.events
            .send(SignalingEvent::Message(message))
            .await
            .expect("Call session stopped");
    }

    pub async fn roster(&self, participants: Vec<ParticipantInfo>) {
        self.deliver(ServerMessage::Participants { participants })
            .await;
    }

    pub async fn joined(&self, info: ParticipantInfo) {
        self.deliver(ServerMessage::ParticipantJoined(info)).await;
    }

    pub async fn left(&self, user: i64, socket: Option<&str>) {
        self.deliver(ServerMessage::ParticipantLeft {
            user_id: UserId::from(user),
            socket_id: socket.map(PeerId::from),
        })
        .await;
    }

    pub async fn signal_from(&self, sender: &str, signal: Signal) {
        self.deliver(ServerMessage::Signal(SignalEnvelope {
            room_id: Some(RoomId::from(ROOM)),
            signal,
            target_id: None,
            sender_id: Some(PeerId::from(sender)),
        }))
        .await;
    }

    /// Delivers a remote offer from `socket` and waits until the answer has
    /// gone out.
    pub async fn negotiate_as_responder(&self, socket: &str) {
        self.signal_from(
            socket,
            Signal::Offer {
                offer: SessionDescription::offer(format!("v=0 offer-from-{socket}")),
            },
        )
        .await;
        wait_for_peer_state(
            &self.handle,
            &PeerId::from(socket),
            NegotiationState::Stable,
        )
        .await;
    }
}
