use meshcall_client::CallState;
use meshcall_core::PeerId;

use crate::integration::{TestCall, create_test_call, init_tracing, participant};
use crate::utils::wait_for_peer_count;

#[tokio::test]
async fn test_dropping_handles_leaves_call() {
    init_tracing();

    let call = create_test_call().await;
    call.roster(vec![participant(2, "s2", "bea")]).await;
    wait_for_peer_count(&call.handle, 1).await;

    let TestCall {
        handle,
        signaling,
        transports,
        events: _events,
        ..
    } = call;
    let mut state = handle.watch_state();
    let clone = handle.clone();
    drop(handle);
    assert_eq!(*state.borrow(), CallState::Joined);
    drop(clone);

    state.wait_for(|s| *s == CallState::Left).await.unwrap();

    assert_eq!(signaling.leaves().await, 1);
    let transport = transports.transport_for(&PeerId::from("s2")).await.unwrap();
    assert!(transport.is_closed().await);
}

#[tokio::test]
async fn test_signaling_stream_end_leaves_call() {
    init_tracing();

    let call = create_test_call().await;
    call.roster(vec![participant(2, "s2", "bea")]).await;
    wait_for_peer_count(&call.handle, 1).await;

    let TestCall {
        handle,
        events,
        transports,
        ..
    } = call;
    drop(events);

    assert_eq!(handle.wait_for_state(CallState::Left).await, CallState::Left);
    assert!(handle.participants().is_empty());
    let transport = transports.transport_for(&PeerId::from("s2")).await.unwrap();
    assert!(transport.is_closed().await);
}
