use meshcall_client::{CallError, CallState, NegotiationStage, NegotiationState};
use meshcall_core::{IceCandidate, PeerId, SessionDescription, Signal};

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{
    MALFORMED, WAIT_TIMEOUT_MS, registry_and_peer_keys, wait_for_peer_count, wait_for_peer_state,
    wait_until,
};

#[tokio::test]
async fn test_malformed_offer_fails_only_that_peer() {
    init_tracing();

    let call = create_test_call().await;
    let s2 = PeerId::from("s2");
    let s3 = PeerId::from("s3");

    call.roster(vec![participant(2, "s2", "bea"), participant(3, "s3", "cai")])
        .await;
    wait_for_peer_count(&call.handle, 2).await;

    call.signal_from(
        "s2",
        Signal::Offer {
            offer: SessionDescription::offer(format!("v=0 {MALFORMED}")),
        },
    )
    .await;
    call.negotiate_as_responder("s3").await;

    wait_for_peer_count(&call.handle, 1).await;
    wait_for_peer_state(&call.handle, &s3, NegotiationState::Stable).await;

    let (registry, peers) = registry_and_peer_keys(&call.handle).await;
    assert_eq!(registry, vec![s3.clone()]);
    assert_eq!(peers, vec![s3.clone()]);

    let failed = call.transports.transport_for(&s2).await.unwrap();
    assert!(failed.is_closed().await);
    assert!(call.signaling.signals_to(&s2).await.is_empty());

    let errors = call.observer.errors().await;
    assert!(errors.iter().any(|e| matches!(
        e,
        CallError::Negotiation(err)
            if err.peer_id == s2 && err.stage == NegotiationStage::SetRemoteDescription
    )));
    assert_eq!(call.handle.state(), CallState::Joined);

    call.handle.leave().await;
}

#[tokio::test]
async fn test_rejected_candidate_fails_only_that_peer() {
    init_tracing();

    let call = create_test_call().await;
    let s2 = PeerId::from("s2");

    call.roster(vec![participant(2, "s2", "bea"), participant(3, "s3", "cai")])
        .await;
    call.negotiate_as_responder("s2").await;

    call.signal_from(
        "s2",
        Signal::IceCandidate {
            candidate: IceCandidate::new(format!("candidate:{MALFORMED}")),
        },
    )
    .await;

    let removed = wait_until(WAIT_TIMEOUT_MS, || async {
        call.handle
            .participants()
            .iter()
            .all(|p| p.peer_id != s2)
    })
    .await;
    assert!(removed);
    wait_for_peer_count(&call.handle, 1).await;

    let errors = call.observer.errors().await;
    assert!(errors.iter().any(|e| matches!(
        e,
        CallError::Negotiation(err) if err.stage == NegotiationStage::AddIceCandidate
    )));

    call.handle.leave().await;
}

#[tokio::test]
async fn test_transport_failure_removes_peer() {
    init_tracing();

    let call = create_test_call().await;
    let s2 = PeerId::from("s2");

    call.roster(vec![participant(2, "s2", "bea")]).await;
    call.negotiate_as_responder("s2").await;

    let transport = call.transports.transport_for(&s2).await.unwrap();
    transport.emit_failed().await;

    wait_for_peer_count(&call.handle, 0).await;
    assert!(call.handle.participants().is_empty());
    assert!(transport.is_closed().await);
    assert_eq!(call.handle.state(), CallState::Joined);

    call.handle.leave().await;
}
