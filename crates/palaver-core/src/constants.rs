/// How long an optimistic echo waits for its server confirmation before it is
/// treated as confirmed-by-timeout and dropped from reconciliation state.
pub const ECHO_CONFIRM_TIMEOUT_SECS: u64 = 60;

/// Maximum number of characters of message content shown in a directory
/// entry's last-message preview.
pub const PREVIEW_MAX_CHARS: usize = 30;

/// Display name used for entries whose chat has no messages yet.
pub const EMPTY_PREVIEW_TEXT: &str = "No messages yet";
