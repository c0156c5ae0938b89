use crate::error::{MediaAccessError, ScreenShareError};
use crate::media::{LocalStream, MediaConstraints, MediaDevices, MediaTrack};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the local capture: camera/microphone stream and the optional screen track.
pub struct LocalMediaSource {
    devices: Arc<dyn MediaDevices>,
    stream: Option<LocalStream>,
    screen: Option<MediaTrack>,
}

impl LocalMediaSource {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            stream: None,
            screen: None,
        }
    }

    pub async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<LocalStream, MediaAccessError> {
        if let Some(stream) = &self.stream {
            return Ok(stream.clone());
        }

        let stream = self.devices.user_media(constraints).await?;
        info!(
            "Local media acquired (audio {}, video {})",
            stream.audio.id(),
            stream.video.id()
        );
        self.stream = Some(stream.clone());
        Ok(stream)
    }

    pub fn stream(&self) -> Option<&LocalStream> {
        self.stream.as_ref()
    }

    /// Returns the new `enabled` state, or `None` before acquisition.
    pub fn toggle_audio(&self) -> Option<bool> {
        self.stream.as_ref().map(|s| s.audio.toggle())
    }

    pub fn toggle_video(&self) -> Option<bool> {
        self.stream.as_ref().map(|s| s.video.toggle())
    }

    /// Screen capture future detached from `self`, so a caller can await the
    /// picker without holding the source.
    pub fn display_capture(
        &self,
    ) -> impl Future<Output = Result<MediaTrack, ScreenShareError>> + Send + 'static {
        let devices = self.devices.clone();
        async move { devices.display_media().await }
    }

    /// Makes `track` the outbound video. Fails if nothing was acquired yet.
    pub fn attach_screen(&mut self, track: MediaTrack) -> Result<(), ScreenShareError> {
        if self.stream.is_none() {
            track.stop();
            return Err(ScreenShareError::Backend(
                "local media has not been acquired".to_owned(),
            ));
        }
        if let Some(previous) = self.screen.replace(track) {
            warn!("Replacing active screen track {}", previous.id());
            previous.stop();
        }
        Ok(())
    }

    pub async fn start_screen_share(&mut self) -> Result<MediaTrack, ScreenShareError> {
        if let Some(screen) = &self.screen {
            return Ok(screen.clone());
        }
        let track = self.display_capture().await?;
        self.attach_screen(track.clone())?;
        Ok(track)
    }

    /// Stops the screen track and hands back the camera track to revert to.
    /// `None` when no screen share was active.
    pub fn stop_screen_share(&mut self) -> Option<MediaTrack> {
        let screen = self.screen.take()?;
        screen.stop();
        self.stream.as_ref().map(|s| s.video.clone())
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen.is_some()
    }

    pub fn screen_track(&self) -> Option<&MediaTrack> {
        self.screen.as_ref()
    }

    pub fn outbound_video(&self) -> Option<MediaTrack> {
        self.screen
            .clone()
            .or_else(|| self.stream.as_ref().map(|s| s.video.clone()))
    }

    /// Tracks a newly created peer connection should send.
    pub fn outbound_tracks(&self) -> Vec<MediaTrack> {
        let Some(stream) = &self.stream else {
            return Vec::new();
        };
        let mut tracks = vec![stream.audio.clone()];
        tracks.extend(self.outbound_video());
        tracks
    }

    /// Stops every local track. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(screen) = self.screen.take() {
            screen.stop();
        }
        if let Some(stream) = self.stream.take() {
            stream.stop();
            info!("Local media released");
        }
    }
}
