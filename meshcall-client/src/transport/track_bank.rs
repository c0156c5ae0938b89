use crate::media::{MediaTrack, TrackKind};
use anyhow::Result;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

struct BankEntry {
    source: MediaTrack,
    local: Arc<TrackLocalStaticSample>,
}

/// WebRTC sample tracks keyed by local track id. Every peer connection
/// attaches the same `TrackLocalStaticSample`, so one written sample reaches
/// all peers.
#[derive(Clone)]
pub struct TrackBank {
    stream_id: String,
    tracks: Arc<DashMap<String, BankEntry>>,
}

impl Default for TrackBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackBank {
    pub fn new() -> Self {
        Self {
            stream_id: format!("meshcall-{}", Uuid::new_v4().simple()),
            tracks: Arc::new(DashMap::new()),
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Shared sample track for `track`. The entry is dropped once `track`
    /// ends.
    pub fn local_track(&self, track: &MediaTrack) -> Arc<TrackLocalStaticSample> {
        self.tracks
            .entry(track.id().to_owned())
            .or_insert_with(|| {
                let tracks = Arc::downgrade(&self.tracks);
                let track_id = track.id().to_owned();
                let _ = track.on_ended(move || {
                    if let Some(tracks) = tracks.upgrade()
                        && tracks.remove(&track_id).is_some()
                    {
                        debug!("Released sample track {}", track_id);
                    }
                });

                BankEntry {
                    source: track.clone(),
                    local: Arc::new(TrackLocalStaticSample::new(
                        codec_for(track.kind()),
                        track.id().to_owned(),
                        self.stream_id.clone(),
                    )),
                }
            })
            .local
            .clone()
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.contains_key(track_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Writes one encoded sample. Returns `false` when the sample was dropped
    /// because the track is unknown, disabled or ended.
    pub async fn write_sample(
        &self,
        track_id: &str,
        data: Bytes,
        duration: Duration,
    ) -> Result<bool> {
        let local = match self.tracks.get(track_id) {
            Some(entry) if entry.source.is_enabled() && !entry.source.is_ended() => {
                entry.local.clone()
            }
            _ => return Ok(false),
        };

        local
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(true)
    }

}

fn codec_for(kind: TrackKind) -> RTCRtpCodecCapability {
    match kind {
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
    }
}
