use std::time::Duration;

use http::StatusCode;

use crate::error::Error;

/// Fixed-interval retry policy: `max_retries + 1` attempts in total, with the
/// same pause between any two of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: usize,
    interval: Duration,
}

impl RetryPolicy {
    pub const fn disabled() -> Self {
        Self {
            max_retries: 0,
            interval: Duration::ZERO,
        }
    }

    pub const fn new(max_retries: usize, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }

    pub const fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub const fn max_retries_value(&self) -> usize {
        self.max_retries
    }

    pub const fn interval_value(&self) -> Duration {
        self.interval
    }

    pub const fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Decides what happens after `attempt` (1-based) ended with `outcome`.
    ///
    /// Only an exact `200` ends the loop successfully. Any other status and
    /// any retryable error is tried again while attempts remain; on the last
    /// attempt it becomes the terminal result. Non-retryable errors end the
    /// loop at once.
    pub fn classify(&self, attempt: usize, outcome: &AttemptOutcome) -> AttemptVerdict {
        match outcome {
            AttemptOutcome::Completed(status) if *status == StatusCode::OK => {
                AttemptVerdict::Success
            }
            AttemptOutcome::Failed { retryable: false } => AttemptVerdict::TerminalFailure,
            AttemptOutcome::Completed(_) | AttemptOutcome::Failed { retryable: true } => {
                if attempt < self.max_attempts() {
                    AttemptVerdict::RetryableFailure
                } else {
                    AttemptVerdict::TerminalFailure
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// What a single attempt produced, reduced to what the retry decision needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Completed(StatusCode),
    Failed { retryable: bool },
}

impl AttemptOutcome {
    pub fn from_result<T>(result: &Result<T, Error>, status: impl Fn(&T) -> StatusCode) -> Self {
        match result {
            Ok(value) => Self::Completed(status(value)),
            Err(error) => Self::Failed {
                retryable: error.is_retryable(),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptVerdict {
    Success,
    RetryableFailure,
    TerminalFailure,
}
