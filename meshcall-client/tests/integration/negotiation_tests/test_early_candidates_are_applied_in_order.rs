use meshcall_client::NegotiationState;
use meshcall_core::{IceCandidate, PeerId, SdpType, SessionDescription, Signal};

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{TransportCall, WAIT_TIMEOUT_MS, wait_for_peer_state, wait_until};

fn candidate(c: &str) -> Signal {
    Signal::IceCandidate {
        candidate: IceCandidate::new(c),
    }
}

#[tokio::test]
async fn test_early_candidates_are_applied_in_order() {
    init_tracing();

    let call = create_test_call().await;
    let s2 = PeerId::from("s2");

    call.roster(vec![participant(2, "s2", "bea")]).await;
    wait_for_peer_state(&call.handle, &s2, NegotiationState::Idle).await;

    for c in ["cand-1", "cand-2", "cand-3"] {
        call.signal_from("s2", candidate(c)).await;
    }

    let queued = wait_until(WAIT_TIMEOUT_MS, || async {
        call.handle
            .peers()
            .await
            .unwrap()
            .iter()
            .any(|p| p.peer_id == s2 && p.queued_candidates == 3)
    })
    .await;
    assert!(queued, "candidates should wait for the remote description");

    let transport = call.transports.transport_for(&s2).await.unwrap();
    assert!(transport.applied_candidates().await.is_empty());

    call.negotiate_as_responder("s2").await;

    assert_eq!(
        transport.applied_candidates().await,
        vec!["cand-1", "cand-2", "cand-3"]
    );

    let calls = transport.calls().await;
    let remote_at = calls
        .iter()
        .position(|c| matches!(c, TransportCall::SetRemoteDescription(SdpType::Offer, _)))
        .unwrap();
    let first_candidate_at = calls
        .iter()
        .position(|c| matches!(c, TransportCall::AddIceCandidate(_)))
        .unwrap();
    assert!(remote_at < first_candidate_at);

    // After the remote description candidates go straight through.
    call.signal_from("s2", candidate("cand-4")).await;
    assert!(
        wait_until(WAIT_TIMEOUT_MS, || async {
            transport.applied_candidates().await.len() == 4
        })
        .await
    );

    call.handle.leave().await;
}

#[tokio::test]
async fn test_candidates_from_unannounced_peer_are_kept() {
    init_tracing();

    let call = create_test_call().await;
    let s9 = PeerId::from("s9");

    call.signal_from("s9", candidate("early-1")).await;
    call.signal_from("s9", candidate("early-2")).await;
    call.signal_from(
        "s9",
        Signal::Offer {
            offer: SessionDescription::offer("v=0 offer-from-s9"),
        },
    )
    .await;

    wait_for_peer_state(&call.handle, &s9, NegotiationState::Stable).await;

    let transport = call.transports.transport_for(&s9).await.unwrap();
    assert_eq!(
        transport.applied_candidates().await,
        vec!["early-1", "early-2"]
    );

    call.handle.leave().await;
}
