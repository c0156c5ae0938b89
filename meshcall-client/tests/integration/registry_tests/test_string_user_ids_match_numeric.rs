use meshcall_core::{PeerId, ServerMessage};

use crate::integration::{create_test_call, init_tracing};
use crate::utils::{wait_for_peer_count, wait_until};

#[tokio::test]
async fn test_string_user_ids_match_numeric() {
    init_tracing();

    let call = create_test_call().await;
    let roster = r#"{"event":"call:participants","data":{"participants":[
        {"userId":"1","socketId":"s1","username":"ana"},
        {"userId":"2","socketId":"s2","username":"bea"}
    ]}}"#;
    call.deliver(serde_json::from_str(roster).unwrap()).await;
    wait_for_peer_count(&call.handle, 1).await;

    let participants = call.handle.participants();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].peer_id, PeerId::from("s2"));
    assert_eq!(call.transports.created_for(&PeerId::from("s1")).await, 0);

    // Numeric id without a socket id still finds the entry announced as "2".
    let left: ServerMessage =
        serde_json::from_str(r#"{"event":"call:participant-left","data":{"userId":2}}"#).unwrap();
    call.deliver(left).await;
    let gone = wait_until(1000, || async { call.handle.participants().is_empty() }).await;
    assert!(gone);
    wait_for_peer_count(&call.handle, 0).await;

    call.handle.leave().await;
}
