use crate::model::peer::PeerId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Roster entry as carried by `call:participants` and `call:participant-joined`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub user_id: UserId,
    pub socket_id: PeerId,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_audio_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_video_enabled: Option<bool>,
}

impl ParticipantInfo {
    pub fn new(user_id: UserId, socket_id: PeerId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            socket_id,
            username: username.into(),
            is_audio_enabled: None,
            is_video_enabled: None,
        }
    }
}
