//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a period in seconds into a `std::time::Duration`, or `None` if the
/// period is negative or not finite.
pub fn seconds_to_std_duration(period_s: f64) -> Option<std::time::Duration> {
    if period_s.is_finite() && period_s >= 0.0 {
        Some(std::time::Duration::from_secs_f64(period_s))
    }
    else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }

    #[test]
    fn test_seconds_to_std_duration() {
        assert_eq!(
            seconds_to_std_duration(0.25),
            Some(std::time::Duration::from_millis(250))
        );
        assert_eq!(seconds_to_std_duration(-1.0), None);
        assert_eq!(seconds_to_std_duration(f64::NAN), None);

        // The period of a zero frequency
        assert_eq!(seconds_to_std_duration(1.0 / 0.0), None);
        assert_eq!(seconds_to_std_duration(1.0 / -60.0), None);
    }
}
