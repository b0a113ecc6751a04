pub const DEFAULT_CHALLENGE_PERIOD_SECS: u64 = 604_800;

/// Lower bits of a withdrawal's message nonce holding the nonce itself; the
/// remaining upper bits encode the message version.
pub const WITHDRAWAL_NONCE_BITS: usize = 240;

/// How many of the most recent games of the respected type are checked when
/// deciding whether a withdrawal can be proven.
pub const RECENT_DISPUTE_GAMES_LIMIT: u64 = 100;
