use crate::media::RemoteTrack;
use meshcall_core::{ParticipantInfo, PeerId, UserId};
use serde::Serialize;

/// A remote call participant as the UI sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub peer_id: PeerId,
    /// Unknown until the peer is announced by the relay.
    pub user_id: Option<UserId>,
    pub display_name: String,
    /// Descriptors of the tracks its connection receives. The media itself
    /// lives and dies with the peer connection.
    pub remote_tracks: Vec<RemoteTrack>,
    /// Best effort, as last announced. Not authoritative.
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

impl Participant {
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            user_id: None,
            display_name: String::new(),
            remote_tracks: Vec::new(),
            audio_enabled: true,
            video_enabled: true,
        }
    }

    pub fn has_media(&self) -> bool {
        !self.remote_tracks.is_empty()
    }

    pub(crate) fn merge(&mut self, update: ParticipantUpdate) {
        if let Some(user_id) = update.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(name) = update.display_name {
            self.display_name = name;
        }
        if let Some(track) = update.remote_track {
            self.remote_tracks.retain(|t| t.id != track.id);
            self.remote_tracks.push(track);
        }
        if let Some(enabled) = update.audio_enabled {
            self.audio_enabled = enabled;
        }
        if let Some(enabled) = update.video_enabled {
            self.video_enabled = enabled;
        }
    }
}

/// Partial participant data. `None` fields leave the entry untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantUpdate {
    pub user_id: Option<UserId>,
    pub display_name: Option<String>,
    pub remote_track: Option<RemoteTrack>,
    pub audio_enabled: Option<bool>,
    pub video_enabled: Option<bool>,
}

impl ParticipantUpdate {
    pub fn track(track: RemoteTrack) -> Self {
        Self {
            remote_track: Some(track),
            ..Default::default()
        }
    }
}

impl From<&ParticipantInfo> for ParticipantUpdate {
    fn from(info: &ParticipantInfo) -> Self {
        Self {
            user_id: Some(info.user_id.clone()),
            display_name: Some(info.username.clone()),
            remote_track: None,
            audio_enabled: info.is_audio_enabled,
            video_enabled: info.is_video_enabled,
        }
    }
}
