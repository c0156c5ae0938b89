pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Room capacity including the local participant.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 8;
