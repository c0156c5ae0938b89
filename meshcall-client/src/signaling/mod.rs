mod signaling_client;
mod signaling_event;
mod signaling_output;
mod ws_signaling;

pub use signaling_client::SignalingClient;
pub use signaling_event::SignalingEvent;
pub use signaling_output::SignalingOutput;
pub use ws_signaling::{ReconnectPolicy, WsSignaling};
