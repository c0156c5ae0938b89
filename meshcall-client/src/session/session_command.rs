use crate::error::CallError;
use crate::media::MediaTrack;
use crate::peer::PeerSnapshot;
use tokio::sync::oneshot;

pub(crate) enum SessionCommand {
    StartScreenShare(oneshot::Sender<Result<MediaTrack, CallError>>),
    StopScreenShare(oneshot::Sender<()>),
    Rejoin(oneshot::Sender<Result<(), CallError>>),
    Peers(oneshot::Sender<Vec<PeerSnapshot>>),
    Leave(oneshot::Sender<()>),
}

/// Results of media work the session loop hands off to spawned tasks.
pub(crate) enum MediaEvent {
    ScreenCaptured {
        result: Result<MediaTrack, CallError>,
        reply: oneshot::Sender<Result<MediaTrack, CallError>>,
    },
    ScreenEnded(String),
}
