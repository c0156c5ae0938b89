use meshcall_client::{CallState, TrackKind};
use meshcall_core::PeerId;

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{TransportCall, wait_for_peer_count};

#[tokio::test]
async fn test_leave_is_idempotent() {
    init_tracing();

    let call = create_test_call().await;
    call.roster(vec![participant(2, "s2", "bea"), participant(3, "s3", "cai")])
        .await;
    wait_for_peer_count(&call.handle, 2).await;
    call.negotiate_as_responder("s2").await;

    let other = call.handle.clone();
    tokio::join!(call.handle.leave(), other.leave());
    call.handle.leave().await;

    assert_eq!(call.handle.state(), CallState::Left);
    assert_eq!(call.signaling.leaves().await, 1);
    assert!(call.handle.participants().is_empty());
    assert!(call.handle.peers().await.is_err());

    for socket in ["s2", "s3"] {
        let transport = call
            .transports
            .transport_for(&PeerId::from(socket))
            .await
            .unwrap();
        assert_eq!(transport.count(|c| *c == TransportCall::Close).await, 1);
    }

    let stream = call.handle.local_stream();
    assert!(stream.audio.is_ended());
    assert!(stream.video.is_ended());
    assert_eq!(stream.video.kind(), TrackKind::Video);

    let states = call.observer.states().await;
    assert_eq!(
        states.iter().filter(|s| **s == CallState::Left).count(),
        1
    );
    assert_eq!(
        &states[states.len() - 2..],
        &[CallState::Leaving, CallState::Left]
    );
}
