mod peer_transport;
mod rtc_transport;
mod track_bank;
mod transport_config;
mod transport_event;

pub use peer_transport::{PeerTransport, TransportFactory};
pub use rtc_transport::{RtcTransport, RtcTransportFactory};
pub use track_bank::TrackBank;
pub use transport_config::TransportConfig;
pub use transport_event::{ConnectionId, TransportEvent};
