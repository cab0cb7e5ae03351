//! Traceback summarization
//!
//! Error responses carry both the full formatted trace (shown on demand)
//! and a short summary for the cell's status affordance.

/// Derive the short error summary shown in the cell's status affordance:
/// the last non-empty line of a formatted trace.
///
/// Falls back to the whole trace when every line is blank.
pub fn traceback_summary(traceback: &str) -> String {
    traceback
        .lines()
        .rev()
        .map(str::trim_end)
        .find(|line| !line.trim().is_empty())
        .unwrap_or(traceback)
        .to_string()
}
