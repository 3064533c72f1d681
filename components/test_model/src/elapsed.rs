//! Elapsed-time display strings.

use std::time::Duration;

/// Shown in place of the elapsed time until a test settles
pub const PLACEHOLDER: &str = "--s";

/// Display string for the time since the run started.
///
/// Whole seconds, at most the first two digits, zero-padded to two
/// characters. Runs of 100 seconds or more show only their leading digits.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use test_model::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::from_millis(999)), "00s");
/// assert_eq!(format_elapsed(Duration::from_secs(7)), "07s");
/// assert_eq!(format_elapsed(Duration::from_secs(125)), "12s");
/// ```
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs().to_string();
    let leading: String = seconds.chars().take(2).collect();
    format!("{leading:0>2}s")
}
