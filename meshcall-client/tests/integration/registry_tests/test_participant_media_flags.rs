use crate::integration::{create_test_call, init_tracing, participant};
use crate::utils::{WAIT_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_participant_media_flags() {
    init_tracing();

    let call = create_test_call().await;

    let mut muted = participant(2, "s2", "bea");
    muted.is_audio_enabled = Some(false);
    let camera_off = {
        let mut info = participant(3, "s3", "cai");
        info.is_video_enabled = Some(false);
        info
    };
    call.roster(vec![muted, camera_off]).await;

    let listed = wait_until(WAIT_TIMEOUT_MS, || async {
        call.handle.participants().len() == 2
    })
    .await;
    assert!(listed);

    let participants = call.handle.participants();
    assert!(!participants[0].audio_enabled);
    assert!(participants[0].video_enabled);
    assert!(participants[1].audio_enabled);
    assert!(!participants[1].video_enabled);
    assert_eq!(participants[1].display_name, "cai");

    call.handle.leave().await;
}
