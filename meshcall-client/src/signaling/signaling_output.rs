use crate::error::SignalingTransportError;
use async_trait::async_trait;
use meshcall_core::ClientMessage;

/// Outbound half of the signaling channel. Whatever carries the messages to
/// the relay implements this.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, message: ClientMessage) -> Result<(), SignalingTransportError>;
}
