use meshcall_core::ServerMessage;

/// Inbound half of the signaling channel.
///
/// `Disconnected` only degrades the call. The event stream ending means the
/// channel is gone for good and the session tears down.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    Message(ServerMessage),
    Disconnected,
    Reconnected,
}

impl From<ServerMessage> for SignalingEvent {
    fn from(message: ServerMessage) -> Self {
        Self::Message(message)
    }
}
