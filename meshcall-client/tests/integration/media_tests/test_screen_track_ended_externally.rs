use meshcall_core::PeerId;

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{ObservedEvent, WAIT_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_screen_track_ended_externally() {
    init_tracing();

    let call = create_test_call().await;
    call.roster(vec![participant(2, "s2", "bea")]).await;
    call.negotiate_as_responder("s2").await;

    let transport = call
        .transports
        .transport_for(&PeerId::from("s2"))
        .await
        .unwrap();
    let camera_id = call.handle.local_stream().video.id().to_owned();

    let screen = call.handle.start_screen_share().await.unwrap();
    assert!(
        wait_until(WAIT_TIMEOUT_MS, || async {
            transport.outbound_video().await.as_deref() == Some(screen.id())
        })
        .await
    );

    // The user stops sharing from the capture source itself.
    screen.stop();

    let reverted = wait_until(WAIT_TIMEOUT_MS, || async {
        !call.handle.is_screen_sharing()
            && transport.outbound_video().await.as_deref() == Some(camera_id.as_str())
    })
    .await;
    assert!(reverted);

    let events = call.observer.events().await;
    let toggles: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ObservedEvent::ScreenShare(active) => Some(*active),
            _ => None,
        })
        .collect();
    assert_eq!(toggles, vec![true, false]);

    call.handle.leave().await;
}
