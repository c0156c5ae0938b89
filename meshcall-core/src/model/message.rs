use crate::model::participant::ParticipantInfo;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use crate::model::signaling::SignalEnvelope;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Messages a call client publishes to the signaling relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "call:join", rename_all = "camelCase")]
    Join {
        room_id: RoomId,
        user_id: UserId,
        username: String,
    },
    #[serde(rename = "call:leave", rename_all = "camelCase")]
    Leave { room_id: RoomId, user_id: UserId },
    #[serde(rename = "call:signal")]
    Signal(SignalEnvelope),
}

/// Messages the relay delivers to a call client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "call:participants")]
    Participants { participants: Vec<ParticipantInfo> },
    #[serde(rename = "call:participant-joined")]
    ParticipantJoined(ParticipantInfo),
    #[serde(rename = "call:participant-left", rename_all = "camelCase")]
    ParticipantLeft {
        user_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        socket_id: Option<PeerId>,
    },
    #[serde(rename = "call:signal")]
    Signal(SignalEnvelope),
    #[serde(rename = "call:error")]
    Error { message: String },
}
