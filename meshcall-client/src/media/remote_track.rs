use crate::media::TrackKind;
use serde::{Deserialize, Serialize};

/// Descriptor of a track received from a remote peer. The media itself stays
/// owned by the peer transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}
