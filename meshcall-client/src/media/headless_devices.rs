use crate::error::{MediaAccessError, ScreenShareError};
use crate::media::{LocalStream, MediaConstraints, MediaDevices, MediaTrack, TrackKind, TrackSource};
use async_trait::async_trait;
use tracing::info;

/// Capture backend without hardware. Its tracks carry whatever samples the
/// host application writes through the transport's `TrackBank`.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDevices {
    screen_capture: bool,
}

impl HeadlessDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen_capture(mut self) -> Self {
        self.screen_capture = true;
        self
    }
}

#[async_trait]
impl MediaDevices for HeadlessDevices {
    async fn user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<LocalStream, MediaAccessError> {
        info!(
            "Opening headless capture {}x{}",
            constraints.video.width, constraints.video.height
        );
        Ok(LocalStream {
            audio: MediaTrack::new(TrackKind::Audio, TrackSource::Microphone, "headless-mic"),
            video: MediaTrack::new(TrackKind::Video, TrackSource::Camera, "headless-camera"),
        })
    }

    async fn display_media(&self) -> Result<MediaTrack, ScreenShareError> {
        if !self.screen_capture {
            return Err(ScreenShareError::NotSupported);
        }
        Ok(MediaTrack::new(
            TrackKind::Video,
            TrackSource::Screen,
            "headless-screen",
        ))
    }
}
