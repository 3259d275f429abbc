use std::time::Duration;

/// Waits out the interval between two attempts.
///
/// Returning `false` aborts the call; the executor then reports
/// [`Error::Interrupted`](crate::Error::Interrupted) instead of starting the
/// next attempt.
pub trait Delay: Send + Sync {
    fn wait(&self, duration: Duration) -> bool;
}

/// Blocks the calling thread for the full interval.
#[derive(Debug, Default)]
pub struct SystemDelay;

impl Delay for SystemDelay {
    fn wait(&self, duration: Duration) -> bool {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
        true
    }
}
