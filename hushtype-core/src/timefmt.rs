/// Hard cap on a single recording session: 10 minutes.
/// Build-time constant; the countdown auto-stops the session at zero.
pub const MAX_RECORDING_DURATION_MS: u64 = 600_000;

/// Format a millisecond duration as `MM:SS` for the countdown display.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
