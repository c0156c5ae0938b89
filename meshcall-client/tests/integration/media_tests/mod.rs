mod test_screen_share_failures_keep_state;
mod test_screen_track_ended_externally;
mod test_toggles_do_not_renegotiate;
