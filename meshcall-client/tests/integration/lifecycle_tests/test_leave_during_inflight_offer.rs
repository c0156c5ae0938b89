use meshcall_client::{CallState, NegotiationState};
use meshcall_core::PeerId;
use std::time::Duration;

use crate::integration::{TestCallBuilder, init_tracing, participant};
use crate::utils::{MockBehavior, MockTransportFactory, wait_for_peer_count, wait_until};

#[tokio::test]
async fn test_leave_during_inflight_offer() {
    init_tracing();

    let transports = MockTransportFactory::with_behavior(MockBehavior {
        offer_delay: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    let call = TestCallBuilder::new()
        .transports(transports.clone())
        .start()
        .await;
    let s3 = PeerId::from("s3");

    call.joined(participant(3, "s3", "cai")).await;
    wait_for_peer_count(&call.handle, 1).await;
    let peers = call.handle.peers().await.unwrap();
    assert_eq!(peers[0].state, NegotiationState::Idle);

    call.handle.leave().await;
    assert_eq!(call.handle.state(), CallState::Left);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(call.signaling.signals_to(&s3).await.is_empty());

    let transport = transports.transport_for(&s3).await.unwrap();
    let closed = wait_until(100, || async { transport.is_closed().await }).await;
    assert!(closed);
    assert_eq!(transport.offers().await, 0);
}
