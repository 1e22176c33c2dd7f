//! Submission Rate Limiting
//!
//! Sliding window per identifier (typically the email being submitted).
//! Only allowed attempts are recorded, so hammering a blocked identifier
//! does not extend its lockout.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_attempts: usize,
    window: Duration,
    attempts: HashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: HashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_attempts, config.window())
    }

    /// Returns true and records the attempt if `identifier` is under its limit.
    pub fn check(&mut self, identifier: &str) -> bool {
        self.check_at(identifier, Instant::now())
    }

    pub fn check_at(&mut self, identifier: &str, now: Instant) -> bool {
        let window = self.window;
        let attempts = self.attempts.entry(identifier.to_string()).or_default();

        // Drop attempts that have left the window
        attempts.retain(|&t| now.saturating_duration_since(t) < window);

        if attempts.len() >= self.max_attempts {
            tracing::debug!(identifier, attempts = attempts.len(), "rate limit reached");
            return false;
        }

        attempts.push(now);
        true
    }

    /// Attempts left in the current window.
    pub fn remaining(&self, identifier: &str) -> usize {
        self.remaining_at(identifier, Instant::now())
    }

    pub fn remaining_at(&self, identifier: &str, now: Instant) -> usize {
        let used = self.attempts.get(identifier).map_or(0, |attempts| {
            attempts
                .iter()
                .filter(|&&t| now.saturating_duration_since(t) < self.window)
                .count()
        });
        self.max_attempts.saturating_sub(used)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_limit_within_window() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.check_at("ada@example.com", start + Duration::from_secs(i)));
        }

        // 6th inside the window is blocked
        assert!(!limiter.check_at("ada@example.com", start + Duration::from_secs(10)));
        assert_eq!(limiter.remaining_at("ada@example.com", start + Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("id", start));
        assert!(limiter.check_at("id", start + Duration::from_secs(30)));
        assert!(!limiter.check_at("id", start + Duration::from_secs(59)));

        // First attempt has aged out; second still counts
        assert!(limiter.check_at("id", start + Duration::from_secs(61)));
        assert!(!limiter.check_at("id", start + Duration::from_secs(62)));
    }

    #[test]
    fn test_denied_attempts_not_recorded() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("id", start));
        for i in 1..10 {
            assert!(!limiter.check_at("id", start + Duration::from_secs(i)));
        }
        assert!(limiter.check_at("id", start + Duration::from_secs(61)));
    }

    #[test]
    fn test_different_identifiers() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(60));

        for _ in 0..5 {
            assert!(limiter.check("id1"));
        }
        assert!(!limiter.check("id1"));

        assert!(limiter.check("id2"));
        assert_eq!(limiter.remaining("id2"), 4);
    }

    #[test]
    fn test_real_clock_expiry() {
        let mut limiter = RateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.check("id"));
        assert!(!limiter.check("id"));

        sleep(Duration::from_millis(80));
        assert!(limiter.check("id"));
    }

    #[test]
    fn test_defaults_from_config() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.max_attempts(), 5);
        assert_eq!(limiter.window(), Duration::from_millis(60_000));
    }
}
