use crate::error::SignalingTransportError;
use crate::signaling::SignalingOutput;
use meshcall_core::{ClientMessage, PeerId, RoomId, Signal, SignalEnvelope, UserId};
use std::sync::Arc;
use tracing::debug;

/// Room-scoped wrapper over a `SignalingOutput`. Holds no media state.
#[derive(Clone)]
pub struct SignalingClient {
    output: Arc<dyn SignalingOutput>,
    room_id: RoomId,
    user_id: UserId,
}

impl SignalingClient {
    pub fn new(output: Arc<dyn SignalingOutput>, room_id: RoomId, user_id: UserId) -> Self {
        Self {
            output,
            room_id,
            user_id,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub async fn join(&self, username: &str) -> Result<(), SignalingTransportError> {
        debug!("-> call:join {} as {}", self.room_id, self.user_id);
        self.output
            .send(ClientMessage::Join {
                room_id: self.room_id.clone(),
                user_id: self.user_id.clone(),
                username: username.to_owned(),
            })
            .await
    }

    pub async fn leave(&self) -> Result<(), SignalingTransportError> {
        debug!("-> call:leave {}", self.room_id);
        self.output
            .send(ClientMessage::Leave {
                room_id: self.room_id.clone(),
                user_id: self.user_id.clone(),
            })
            .await
    }

    /// Unicasts a negotiation message to `target`.
    pub async fn send_signal(
        &self,
        target: &PeerId,
        signal: Signal,
    ) -> Result<(), SignalingTransportError> {
        debug!("-> call:signal {} to {}", signal.kind(), target);
        self.output
            .send(ClientMessage::Signal(SignalEnvelope {
                room_id: Some(self.room_id.clone()),
                signal,
                target_id: Some(target.clone()),
                sender_id: None,
            }))
            .await
    }
}
