use crate::error::CallError;
use crate::media::{LocalStream, MediaTrack};
use crate::peer::PeerSnapshot;
use crate::registry::Participant;
use crate::session::session_command::SessionCommand;
use crate::session::{CallState, SignalingStatus};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

/// Cloneable control surface of a running call. Dropping the last handle
/// leaves the call.
#[derive(Clone)]
pub struct CallHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    stream: LocalStream,
    state_rx: watch::Receiver<CallState>,
    participants_rx: watch::Receiver<Vec<Participant>>,
    status_rx: watch::Receiver<SignalingStatus>,
    screen_rx: watch::Receiver<bool>,
}

impl CallHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        stream: LocalStream,
        state_rx: watch::Receiver<CallState>,
        participants_rx: watch::Receiver<Vec<Participant>>,
        status_rx: watch::Receiver<SignalingStatus>,
        screen_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            command_tx,
            stream,
            state_rx,
            participants_rx,
            status_rx,
            screen_rx,
        }
    }

    /// Mutes or unmutes the microphone for every peer at once. Local only:
    /// nothing is signaled and no connection renegotiates.
    pub fn toggle_audio(&self) -> bool {
        let enabled = self.stream.audio.toggle();
        debug!("Microphone enabled: {}", enabled);
        enabled
    }

    pub fn toggle_video(&self) -> bool {
        let enabled = self.stream.video.toggle();
        debug!("Camera enabled: {}", enabled);
        enabled
    }

    pub fn is_audio_enabled(&self) -> bool {
        self.stream.audio.is_enabled()
    }

    pub fn is_video_enabled(&self) -> bool {
        self.stream.video.is_enabled()
    }

    pub fn local_stream(&self) -> &LocalStream {
        &self.stream
    }

    /// Resolves with the screen track once every connection has been told to
    /// send it. Already sharing returns the current track.
    pub async fn start_screen_share(&self) -> Result<MediaTrack, CallError> {
        self.request(SessionCommand::StartScreenShare).await?
    }

    /// Reverts every connection to the camera. A no-op when not sharing.
    pub async fn stop_screen_share(&self) -> Result<(), CallError> {
        self.request(SessionCommand::StopScreenShare).await
    }

    /// Re-sends `call:join`, e.g. after the signaling channel came back.
    pub async fn rejoin(&self) -> Result<(), CallError> {
        self.request(SessionCommand::Rejoin).await?
    }

    pub async fn peers(&self) -> Result<Vec<PeerSnapshot>, CallError> {
        self.request(SessionCommand::Peers).await
    }

    /// Leaves the call and waits for teardown. Safe to call any number of
    /// times, from any clone.
    pub async fn leave(&self) {
        if self.request(SessionCommand::Leave).await.is_err() {
            debug!("Call already left");
        }
        self.wait_for_state(CallState::Left).await;
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.participants_rx.borrow().clone()
    }

    pub fn state(&self) -> CallState {
        *self.state_rx.borrow()
    }

    pub fn signaling_status(&self) -> SignalingStatus {
        *self.status_rx.borrow()
    }

    pub fn is_screen_sharing(&self) -> bool {
        *self.screen_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<CallState> {
        self.state_rx.clone()
    }

    pub fn watch_participants(&self) -> watch::Receiver<Vec<Participant>> {
        self.participants_rx.clone()
    }

    /// Waits until the call has reached at least `target`.
    pub async fn wait_for_state(&self, target: CallState) -> CallState {
        let mut rx = self.state_rx.clone();
        if let Ok(state) = rx.wait_for(|state| *state >= target).await {
            return *state;
        }
        *rx.borrow()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, CallError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(command(tx))
            .await
            .map_err(|_| CallError::SessionClosed)?;
        rx.await.map_err(|_| CallError::SessionClosed)
    }
}
