use std::env;
use std::path::PathBuf;

/// First and last gates of the lifecycle.
pub const FIRST_GATE: i64 = 1;
pub const FINAL_GATE: i64 = 7;

/// Days an approval record stays open before it is due.
pub const APPROVAL_DUE_DAYS: i64 = 7;

/// Default notice period for a gate when the routing table carries none.
pub const DEFAULT_NOTICE_DAYS: i64 = 14;

/// Display names for the seven gates, indexed by gate number.
pub const GATE_NAMES: [&str; 7] = [
    "Early Bid Decision",
    "Bid/No Bid Decision",
    "Bid Submission",
    "Contract Approval",
    "Launch Review",
    "Contracted Works Acceptance",
    "Contract Close & Learning",
];

/// Display name for a gate number, if it is in range.
pub fn gate_name(gate: i64) -> Option<&'static str> {
    if (FIRST_GATE..=FINAL_GATE).contains(&gate) {
        Some(GATE_NAMES[(gate - 1) as usize])
    } else {
        None
    }
}

/// Get the path to the Stagegate data directory (~/.stagegate)
pub fn stagegate_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".stagegate")
    } else {
        // Fall back to dirs crate for normal usage
        dirs::home_dir()
            .expect("Unable to get home directory")
            .join(".stagegate")
    }
}
