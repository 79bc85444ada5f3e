//! Fixed-window message throttle.
//!
//! Each connection owns a [`RateWindow`]. The first accepted message of a
//! window schedules a reset one window length later; the count returns to
//! zero only when that reset fires, never retroactively.
//!
//! ```text
//! attempt ──► count += 1 ──► count > limit? ──yes──► Limited { retry_after: window }
//!                                 │
//!                                 no
//!                                 ▼
//!                     reset scheduled? ──no──► schedule(token, window)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::config::ChatConfig;
use crate::identifiers::ResetToken;

// ============================================================================
// RateDecision
// ============================================================================

/// Outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The message may be sent.
    Allowed {
        /// A reset that must be scheduled after the window length.
        schedule: Option<ResetToken>,
    },
    /// The budget for the current window is spent.
    Limited {
        /// Suggested delay before retrying. Always the full window length.
        retry_after: Duration,
    },
}

impl RateDecision {
    /// Returns `true` if the message may be sent.
    #[inline]
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

// ============================================================================
// RateLimiter
// ============================================================================

/// Limit and window shared by every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Creates a limiter allowing `limit` messages per `window`.
    #[inline]
    #[must_use]
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// Creates a limiter from the chat configuration.
    #[inline]
    #[must_use]
    pub const fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.rate_limit, config.rate_window)
    }

    /// Returns the window length.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Counts one send attempt against `state`.
    ///
    /// `issue` is called at most once, to obtain the token for a newly
    /// scheduled reset.
    pub fn attempt(
        &self,
        state: &mut RateWindow,
        issue: impl FnOnce() -> ResetToken,
    ) -> RateDecision {
        state.count = state.count.saturating_add(1);

        if state.count > self.limit {
            return RateDecision::Limited {
                retry_after: self.window,
            };
        }

        if state.scheduled.is_some() {
            return RateDecision::Allowed { schedule: None };
        }

        let token = issue();
        state.scheduled = Some(token);
        RateDecision::Allowed {
            schedule: Some(token),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

// ============================================================================
// RateWindow
// ============================================================================

/// Per-connection counter and pending reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateWindow {
    count: u32,
    scheduled: Option<ResetToken>,
}

impl RateWindow {
    /// Messages counted in the current window, rejected ones included.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// The pending reset, if any.
    #[inline]
    #[must_use]
    pub const fn scheduled(&self) -> Option<ResetToken> {
        self.scheduled
    }

    /// Applies a fired reset.
    ///
    /// Returns `false` and changes nothing if `token` is not the pending
    /// reset (already fired, cancelled, or superseded).
    pub fn reset(&mut self, token: ResetToken) -> bool {
        if self.scheduled != Some(token) {
            return false;
        }
        self.count = 0;
        self.scheduled = None;
        true
    }

    /// Takes the pending reset so it can be cancelled.
    pub fn cancel(&mut self) -> Option<ResetToken> {
        self.scheduled.take()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(10, Duration::from_millis(5000))
    }

    #[test]
    fn test_first_message_schedules_reset() {
        let limiter = limiter();
        let mut window = RateWindow::default();

        let decision = limiter.attempt(&mut window, || ResetToken::new(1));
        assert_eq!(
            decision,
            RateDecision::Allowed {
                schedule: Some(ResetToken::new(1))
            }
        );
        assert_eq!(window.scheduled(), Some(ResetToken::new(1)));
    }

    #[test]
    fn test_only_one_reset_per_window() {
        let limiter = limiter();
        let mut window = RateWindow::default();
        let mut issued = 0;

        for _ in 0..10 {
            let decision = limiter.attempt(&mut window, || {
                issued += 1;
                ResetToken::new(issued)
            });
            assert!(decision.is_allowed());
        }
        assert_eq!(issued, 1);
        assert_eq!(window.count(), 10);
    }

    #[test]
    fn test_eleventh_message_is_limited_with_full_window() {
        let limiter = limiter();
        let mut window = RateWindow::default();
        for _ in 0..10 {
            limiter.attempt(&mut window, || ResetToken::new(1));
        }

        let decision = limiter.attempt(&mut window, || ResetToken::new(2));
        assert_eq!(
            decision,
            RateDecision::Limited {
                retry_after: Duration::from_millis(5000)
            }
        );
        assert_eq!(window.scheduled(), Some(ResetToken::new(1)));
    }

    #[test]
    fn test_reset_clears_count() {
        let limiter = limiter();
        let mut window = RateWindow::default();
        for _ in 0..12 {
            limiter.attempt(&mut window, || ResetToken::new(1));
        }

        assert!(window.reset(ResetToken::new(1)));
        assert_eq!(window.count(), 0);
        assert_eq!(window.scheduled(), None);
        assert!(limiter.attempt(&mut window, || ResetToken::new(2)).is_allowed());
        assert_eq!(window.count(), 1);
    }

    #[test]
    fn test_stale_reset_is_ignored() {
        let limiter = limiter();
        let mut window = RateWindow::default();
        limiter.attempt(&mut window, || ResetToken::new(2));

        assert!(!window.reset(ResetToken::new(1)));
        assert_eq!(window.count(), 1);
    }

    #[test]
    fn test_cancel_takes_pending_reset_once() {
        let limiter = limiter();
        let mut window = RateWindow::default();
        limiter.attempt(&mut window, || ResetToken::new(3));

        assert_eq!(window.cancel(), Some(ResetToken::new(3)));
        assert_eq!(window.cancel(), None);
    }
}
