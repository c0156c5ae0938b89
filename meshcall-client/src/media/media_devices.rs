use crate::error::{MediaAccessError, ScreenShareError};
use crate::media::{LocalStream, MediaConstraints, MediaTrack};
use async_trait::async_trait;

/// Capture backend the Local Media Source acquires tracks from.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// One audio and one video track.
    async fn user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<LocalStream, MediaAccessError>;

    /// A single video-only screen capture track.
    async fn display_media(&self) -> Result<MediaTrack, ScreenShareError>;
}
