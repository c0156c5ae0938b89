use crate::media::MediaTrack;

/// Camera and microphone capture, one track each.
#[derive(Debug, Clone)]
pub struct LocalStream {
    pub audio: MediaTrack,
    pub video: MediaTrack,
}

impl LocalStream {
    pub fn tracks(&self) -> [MediaTrack; 2] {
        [self.audio.clone(), self.video.clone()]
    }

    pub fn stop(&self) {
        self.audio.stop();
        self.video.stop();
    }
}
