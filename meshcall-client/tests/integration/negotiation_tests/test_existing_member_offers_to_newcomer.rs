use meshcall_client::{NegotiationState, PeerRole};
use meshcall_core::{PeerId, SessionDescription, Signal};

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{wait_for_peer_count, wait_for_peer_state};

#[tokio::test]
async fn test_existing_member_offers_to_newcomer() {
    init_tracing();

    let call = create_test_call().await;
    let s2 = PeerId::from("s2");
    let s3 = PeerId::from("s3");

    // s2 was here first: it offers to us, we only answer.
    call.roster(vec![participant(2, "s2", "bea")]).await;
    wait_for_peer_count(&call.handle, 1).await;
    wait_for_peer_state(&call.handle, &s2, NegotiationState::Idle).await;

    // s3 arrives after us: we offer.
    call.joined(participant(3, "s3", "cai")).await;
    wait_for_peer_state(&call.handle, &s3, NegotiationState::OfferSent).await;

    assert!(call.signaling.signals_to(&s2).await.is_empty());
    assert_eq!(call.signaling.signals_to(&s3).await.len(), 1);

    let peers = call.handle.peers().await.unwrap();
    let role_of = |id: &PeerId| peers.iter().find(|p| &p.peer_id == id).unwrap().role;
    assert_eq!(role_of(&s2), PeerRole::Responder);
    assert_eq!(role_of(&s3), PeerRole::Initiator);

    call.negotiate_as_responder("s2").await;
    call.signal_from(
        "s3",
        Signal::Answer {
            answer: SessionDescription::answer("v=0 answer-from-s3"),
        },
    )
    .await;
    wait_for_peer_state(&call.handle, &s3, NegotiationState::Stable).await;

    let s2_transport = call.transports.transport_for(&s2).await.unwrap();
    assert_eq!(s2_transport.offers().await, 0);
    assert_eq!(s2_transport.answers().await, 1);

    let s3_transport = call.transports.transport_for(&s3).await.unwrap();
    assert_eq!(s3_transport.offers().await, 1);
    assert_eq!(s3_transport.answers().await, 0);

    call.handle.leave().await;
}
