//! Bounded retry with reset-between-attempts.
//!
//! Verification against the chat UI is non-deterministic: responses stream in,
//! tool usage is reported late, and the page occasionally wedges. The recovery
//! model is deliberately coarse (reload the page, redo the setup, try again),
//! expressed as an explicit attempt state machine instead of nested catch
//! blocks: attempt → action → verify → {success | reset-and-retry | give-up}.

use crate::Error;

/// How many attempts to make and how long to settle after a reset reload.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub reload_settle_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            reload_settle_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Policy with a caller-supplied attempt budget (minimum 1).
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            ..Self::default()
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Reset the page and run attempt `attempt + 1`.
    ResetAndRetry { attempt: u32 },
    /// Budget exhausted; surface the last recorded error.
    GiveUp,
}

/// Tracks one verification call's attempts and its last error.
///
/// Scoped to a single call; nothing persists across verifications.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    last_error: Option<Error>,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            last_error: None,
        }
    }

    /// Start the next attempt; returns the 1-based attempt number.
    pub fn begin(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Current attempt number (0 before the first `begin`).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure and decide the next step. The attempt counter never
    /// exceeds the configured budget.
    pub fn record_failure(&mut self, err: Error) -> Step {
        self.last_error = Some(err);
        if self.attempt >= self.policy.attempts {
            Step::GiveUp
        } else {
            Step::ResetAndRetry {
                attempt: self.attempt,
            }
        }
    }

    /// The error to rethrow after `GiveUp`: the last one, unmodified.
    pub fn into_last_error(self) -> Error {
        self.last_error
            .unwrap_or_else(|| Error::AssertionFailed("gave up with no recorded error".into()))
    }

    pub fn reload_settle_ms(&self) -> u64 {
        self.policy.reload_settle_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boom(msg: &str) -> Error {
        Error::AssertionFailed(msg.into())
    }

    #[test]
    fn test_attempt_budget_is_respected() {
        let mut state = RetryState::new(RetryPolicy::with_attempts(3));

        assert_eq!(state.begin(), 1);
        assert_eq!(
            state.record_failure(boom("first")),
            Step::ResetAndRetry { attempt: 1 }
        );
        assert_eq!(state.begin(), 2);
        assert_eq!(
            state.record_failure(boom("second")),
            Step::ResetAndRetry { attempt: 2 }
        );
        assert_eq!(state.begin(), 3);
        assert_eq!(state.record_failure(boom("third")), Step::GiveUp);
        assert_eq!(state.attempt(), 3);
    }

    #[test]
    fn test_give_up_surfaces_last_error() {
        let mut state = RetryState::new(RetryPolicy::with_attempts(2));
        state.begin();
        state.record_failure(boom("first"));
        state.begin();
        state.record_failure(boom("second"));

        let err = state.into_last_error();
        assert!(err.to_string().contains("second"));
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let mut state = RetryState::new(RetryPolicy::with_attempts(1));
        state.begin();
        assert_eq!(state.record_failure(boom("only")), Step::GiveUp);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::with_attempts(0);
        assert_eq!(policy.attempts, 1);
    }

    #[test]
    fn test_no_recorded_error_fallback() {
        let state = RetryState::new(RetryPolicy::default());
        let err = state.into_last_error();
        assert!(err.to_string().contains("no recorded error"));
    }
}
