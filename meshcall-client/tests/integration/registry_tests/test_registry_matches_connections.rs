use meshcall_core::{PeerId, SessionDescription, Signal};

use crate::integration::{TestCall, create_test_call, init_tracing, participant};
use crate::utils::{MALFORMED, WAIT_TIMEOUT_MS, registry_and_peer_keys, wait_until};

async fn assert_keys(call: &TestCall, expected: &[&str]) {
    let expected: Vec<PeerId> = expected.iter().map(|s| PeerId::from(*s)).collect();
    let settled = wait_until(WAIT_TIMEOUT_MS, || async {
        registry_and_peer_keys(&call.handle).await == (expected.clone(), expected.clone())
    })
    .await;
    assert!(
        settled,
        "registry and connections diverged: {:?}",
        registry_and_peer_keys(&call.handle).await
    );
}

#[tokio::test]
async fn test_registry_matches_connections() {
    init_tracing();

    let call = create_test_call().await;

    call.roster(vec![participant(2, "s2", "bea"), participant(3, "s3", "cai")])
        .await;
    assert_keys(&call, &["s2", "s3"]).await;

    call.joined(participant(4, "s4", "dov")).await;
    assert_keys(&call, &["s2", "s3", "s4"]).await;

    call.left(3, Some("s3")).await;
    assert_keys(&call, &["s2", "s4"]).await;

    call.negotiate_as_responder("s6").await;
    assert_keys(&call, &["s2", "s4", "s6"]).await;

    call.signal_from(
        "s2",
        Signal::Offer {
            offer: SessionDescription::offer(format!("v=0 {MALFORMED}")),
        },
    )
    .await;
    assert_keys(&call, &["s4", "s6"]).await;

    call.left(4, None).await;
    assert_keys(&call, &["s6"]).await;

    // Rejoining under the same socket id opens a fresh connection.
    call.joined(participant(4, "s4", "dov")).await;
    assert_keys(&call, &["s4", "s6"]).await;
    assert_eq!(call.transports.created_for(&PeerId::from("s4")).await, 2);

    call.handle.leave().await;
    assert_keys(&call, &[]).await;
}
