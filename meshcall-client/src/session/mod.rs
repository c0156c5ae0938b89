mod call_handle;
mod call_observer;
mod call_session;
mod session_command;
mod session_state;

pub use call_handle::CallHandle;
pub use call_observer::{CallObserver, NoopObserver};
pub use call_session::{CallDeps, CallSession, JoinRequest};
pub use session_state::{CallState, SignalingStatus};
