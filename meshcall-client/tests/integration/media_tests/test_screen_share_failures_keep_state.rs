use meshcall_client::{CallError, CallState, HeadlessDevices, ScreenShareError, Severity};

use crate::integration::{TestCallBuilder, init_tracing};
use crate::utils::CancelledPicker;

#[tokio::test]
async fn test_cancelled_screen_share_keeps_state() {
    init_tracing();

    let call = TestCallBuilder::new().devices(CancelledPicker).start().await;
    let camera_id = call.handle.local_stream().video.id().to_owned();

    let error = call.handle.start_screen_share().await.unwrap_err();
    assert_eq!(error, CallError::ScreenShare(ScreenShareError::Cancelled));
    assert_eq!(error.severity(), Severity::Recoverable);

    assert!(!call.handle.is_screen_sharing());
    assert_eq!(call.handle.state(), CallState::Joined);
    assert!(!call.handle.local_stream().video.is_ended());
    assert_eq!(call.handle.local_stream().video.id(), camera_id);
    assert!(call.observer.errors().await.contains(&error));

    call.handle.leave().await;
}

#[tokio::test]
async fn test_unsupported_screen_share_keeps_state() {
    init_tracing();

    let call = TestCallBuilder::new()
        .devices(HeadlessDevices::new())
        .start()
        .await;

    let error = call.handle.start_screen_share().await.unwrap_err();
    assert_eq!(error, CallError::ScreenShare(ScreenShareError::NotSupported));
    assert!(!call.handle.is_screen_sharing());
    assert_eq!(call.handle.state(), CallState::Joined);

    call.handle.leave().await;
}
