//! Error classification and reconnect backoff for the dispatch loop
//! (spec.md §4.4.4).

use std::time::Duration;

const RECOVERABLE_SUBSTRINGS: &[&str] = &[
    "connection",
    "timeout",
    "temporary",
    "retry",
    "unavailable",
    "overload",
    "congestion",
    "resource",
    "busy",
    "rate limit",
    "throttle",
];

/// Whether an error message describes a transient condition worth a
/// nack-requeue rather than a terminal `Failed` classification.
pub fn is_recoverable(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    RECOVERABLE_SUBSTRINGS.iter().any(|s| lower.contains(s))
}

const INITIAL_BACKOFF: Duration = Duration::from_secs(5);
const BACKOFF_FACTOR: f64 = 1.5;
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential backoff for queue reconnect attempts: 5s initial, 1.5x factor,
/// capped at 60s, reset on a successful reconnect.
pub struct ReconnectBackoff {
    current: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self { current: INITIAL_BACKOFF }
    }
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delay to wait before the next attempt, then advances.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let scaled = self.current.mul_f64(BACKOFF_FACTOR);
        self.current = scaled.min(MAX_BACKOFF);
        delay
    }

    pub fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_substrings_match_case_insensitively() {
        assert!(is_recoverable("Connection reset by peer"));
        assert!(is_recoverable("request TIMEOUT after 30s"));
        assert!(is_recoverable("please retry later"));
        assert!(is_recoverable("rate limit exceeded"));
    }

    #[test]
    fn non_recoverable_message_is_not_flagged() {
        assert!(!is_recoverable("invalid api key"));
        assert!(!is_recoverable("malformed json payload"));
    }

    #[test]
    fn backoff_grows_by_factor_and_caps() {
        let mut b = ReconnectBackoff::new();
        assert_eq!(b.next_delay(), Duration::from_secs(5));
        assert_eq!(b.next_delay(), Duration::from_millis(7500));
        for _ in 0..20 {
            b.next_delay();
        }
        assert_eq!(b.next_delay(), MAX_BACKOFF);
    }

    #[test]
    fn backoff_reset_returns_to_initial() {
        let mut b = ReconnectBackoff::new();
        b.next_delay();
        b.next_delay();
        b.reset();
        assert_eq!(b.next_delay(), INITIAL_BACKOFF);
    }
}
