//! Time formatting helpers.

use chrono::{DateTime, Local};
use std::time::Duration;

/// Format a run timestamp the way checkpoint file names carry it
/// (`2024-05-01-13-07-42`).
#[must_use]
pub fn run_stamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Format an elapsed duration as `Hh Mm Ss`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "0h 0m 59s");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_elapsed(Duration::from_millis(90_999)), "0h 1m 30s");
    }

    #[test]
    fn test_run_stamp() {
        let now = Local
            .with_ymd_and_hms(2024, 5, 1, 13, 7, 42)
            .single()
            .expect("unambiguous time");
        assert_eq!(run_stamp(now), "2024-05-01-13-07-42");
    }
}
