use meshcall_core::PeerId;
use std::time::Duration;

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::wait_for_peer_count;

#[tokio::test]
async fn test_toggles_do_not_renegotiate() {
    init_tracing();

    let call = create_test_call().await;
    call.roster(vec![participant(2, "s2", "bea"), participant(3, "s3", "cai")])
        .await;
    wait_for_peer_count(&call.handle, 2).await;
    call.negotiate_as_responder("s2").await;

    let messages_before = call.signaling.messages().await.len();
    let peers_before = call.handle.peers().await.unwrap();
    let transport = call
        .transports
        .transport_for(&PeerId::from("s2"))
        .await
        .unwrap();
    let calls_before = transport.calls().await.len();

    assert!(!call.handle.toggle_audio());
    assert!(!call.handle.is_audio_enabled());
    assert!(!call.handle.local_stream().audio.is_enabled());
    assert!(!call.handle.toggle_video());
    assert!(!call.handle.is_video_enabled());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(call.signaling.messages().await.len(), messages_before);
    assert_eq!(call.handle.peers().await.unwrap(), peers_before);
    assert_eq!(transport.calls().await.len(), calls_before);

    assert!(call.handle.toggle_audio());
    assert!(call.handle.toggle_video());
    assert!(call.handle.is_audio_enabled());
    assert!(call.handle.is_video_enabled());
    assert_eq!(call.signaling.messages().await.len(), messages_before);

    call.handle.leave().await;
}
