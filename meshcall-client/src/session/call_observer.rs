use crate::error::CallError;
use crate::registry::Participant;
use crate::session::{CallState, SignalingStatus};
use async_trait::async_trait;

/// UI-facing callbacks of a call. Every method has a no-op default.
///
/// Called from the session loop, so implementations should return quickly.
#[async_trait]
pub trait CallObserver: Send + Sync + 'static {
    async fn on_state_changed(&self, _state: CallState) {}

    async fn on_participants(&self, _participants: &[Participant]) {}

    async fn on_error(&self, _error: &CallError) {}

    async fn on_signaling_status(&self, _status: SignalingStatus) {}

    async fn on_screen_share(&self, _active: bool) {}
}

pub struct NoopObserver;

impl CallObserver for NoopObserver {}
