mod headless_devices;
mod local_media_source;
mod local_stream;
mod media_constraints;
mod media_devices;
mod media_track;
mod remote_track;

pub use headless_devices::HeadlessDevices;
pub use local_media_source::LocalMediaSource;
pub use local_stream::LocalStream;
pub use media_constraints::{AudioConstraints, MediaConstraints, VideoConstraints};
pub use media_devices::MediaDevices;
pub use media_track::{MediaTrack, TrackKind, TrackSource};
pub use remote_track::RemoteTrack;
