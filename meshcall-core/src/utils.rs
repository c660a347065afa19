pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Path the signaling WebSocket is mounted on.
pub const SIGNALING_PATH: &str = "/ws";

/// Number of id characters shown in participant labels.
pub const SHORT_ID_LEN: usize = 6;
