// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Reconnect backoff for the chat transport connection (§4.11). The
//! transport itself is external; this crate only computes the delay
//! schedule the transport adapter is expected to honor.
use std::time::Duration;

use fetch_config::ReconnectConfig;

/// Exponential backoff with jitter, capped at `max_ms`, giving up after
/// `max_attempts`.
pub struct ReconnectBackoff {
    cfg: ReconnectConfig,
}

impl ReconnectBackoff {
    pub fn new(cfg: ReconnectConfig) -> Self {
        Self { cfg }
    }

    /// Delay before reconnect attempt `attempt` (1-indexed). `None` once
    /// `max_attempts` is exceeded — the caller should stop retrying.
    pub fn delay_for(&self, attempt: u32, jitter_sample: u64) -> Option<Duration> {
        if attempt == 0 || attempt > self.cfg.max_attempts {
            return None;
        }
        let exp = self.cfg.base_ms.saturating_mul(1u64 << (attempt - 1).min(20));
        let capped = exp.min(self.cfg.max_ms);
        let jitter = if self.cfg.jitter_ms == 0 { 0 } else { jitter_sample % self.cfg.jitter_ms };
        Some(Duration::from_millis(capped + jitter))
    }

    pub fn max_attempts(&self) -> u32 {
        self.cfg.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ReconnectConfig {
        ReconnectConfig { base_ms: 5_000, max_ms: 300_000, jitter_ms: 2_000, max_attempts: 10 }
    }

    #[test]
    fn first_attempt_uses_base_delay() {
        let backoff = ReconnectBackoff::new(cfg());
        let d = backoff.delay_for(1, 0).unwrap();
        assert_eq!(d, Duration::from_millis(5_000));
    }

    #[test]
    fn delay_grows_exponentially_then_caps() {
        let backoff = ReconnectBackoff::new(cfg());
        let d2 = backoff.delay_for(2, 0).unwrap();
        let d3 = backoff.delay_for(3, 0).unwrap();
        assert_eq!(d2, Duration::from_millis(10_000));
        assert_eq!(d3, Duration::from_millis(20_000));

        let d_far = backoff.delay_for(20, 0).unwrap();
        assert_eq!(d_far, Duration::from_millis(300_000));
    }

    #[test]
    fn jitter_is_bounded_by_jitter_ms() {
        let backoff = ReconnectBackoff::new(cfg());
        let d = backoff.delay_for(1, 1_999).unwrap();
        assert_eq!(d, Duration::from_millis(5_000 + 1_999));
    }

    #[test]
    fn no_delay_past_max_attempts() {
        let backoff = ReconnectBackoff::new(cfg());
        assert!(backoff.delay_for(11, 0).is_none());
    }

    #[test]
    fn attempt_zero_is_invalid() {
        let backoff = ReconnectBackoff::new(cfg());
        assert!(backoff.delay_for(0, 0).is_none());
    }
}
