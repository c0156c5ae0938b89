use meshcall_core::PeerId;

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{WAIT_TIMEOUT_MS, registry_and_peer_keys, wait_for_peer_count, wait_until};

#[tokio::test]
async fn test_departure_by_socket_id() {
    init_tracing();

    let call = create_test_call().await;
    let s2 = PeerId::from("s2");
    let s3 = PeerId::from("s3");

    call.roster(vec![participant(2, "s2", "bea"), participant(3, "s3", "cai")])
        .await;
    wait_for_peer_count(&call.handle, 2).await;

    call.left(2, Some("s2")).await;
    wait_for_peer_count(&call.handle, 1).await;

    let (registry, peers) = registry_and_peer_keys(&call.handle).await;
    assert_eq!(registry, vec![s3.clone()]);
    assert_eq!(peers, vec![s3.clone()]);
    assert!(call.transports.transport_for(&s2).await.unwrap().is_closed().await);

    // A repeated departure is a no-op.
    call.left(2, Some("s2")).await;
    call.left(9, None).await;
    let _ = call.handle.peers().await.unwrap();
    assert_eq!(call.handle.participants().len(), 1);

    call.handle.leave().await;
}

#[tokio::test]
async fn test_departure_by_user_id_only() {
    init_tracing();

    let call = create_test_call().await;
    call.roster(vec![participant(2, "s2", "bea"), participant(3, "s3", "cai")])
        .await;
    wait_for_peer_count(&call.handle, 2).await;

    call.left(3, None).await;

    let gone = wait_until(WAIT_TIMEOUT_MS, || async {
        call.handle.participants().len() == 1
    })
    .await;
    assert!(gone);
    wait_for_peer_count(&call.handle, 1).await;
    assert_eq!(call.handle.participants()[0].peer_id, PeerId::from("s2"));

    call.handle.leave().await;
}
