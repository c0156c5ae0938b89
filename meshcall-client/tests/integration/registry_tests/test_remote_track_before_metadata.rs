use meshcall_client::{NegotiationState, TrackKind};
use meshcall_core::{PeerId, UserId};

use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{WAIT_TIMEOUT_MS, wait_for_peer_state, wait_until};

#[tokio::test]
async fn test_remote_track_before_metadata() {
    init_tracing();

    let call = create_test_call().await;
    let s5 = PeerId::from("s5");

    // Media shows up before the relay has announced the participant.
    call.negotiate_as_responder("s5").await;
    let transport = call.transports.transport_for(&s5).await.unwrap();
    transport.emit_remote_track("v5", TrackKind::Video).await;

    let partial = wait_until(WAIT_TIMEOUT_MS, || async {
        call.handle
            .participants()
            .iter()
            .any(|p| p.peer_id == s5 && p.has_media())
    })
    .await;
    assert!(partial);

    let entry = call.handle.participants()[0].clone();
    assert_eq!(entry.user_id, None);
    assert!(entry.display_name.is_empty());

    call.joined(participant(5, "s5", "eve")).await;

    let completed = wait_until(WAIT_TIMEOUT_MS, || async {
        call.handle
            .participants()
            .iter()
            .any(|p| p.peer_id == s5 && p.display_name == "eve")
    })
    .await;
    assert!(completed);

    let participants = call.handle.participants();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].user_id, Some(UserId::from(5)));
    assert_eq!(participants[0].remote_tracks.len(), 1);
    assert_eq!(participants[0].remote_tracks[0].id, "v5");

    // The late announcement does not open a second connection.
    assert_eq!(call.transports.created_for(&s5).await, 1);
    wait_for_peer_state(&call.handle, &s5, NegotiationState::Stable).await;

    call.handle.leave().await;
}
