//! Polling helpers for the few places that wait on another thread.

use std::thread;
use std::time::{Duration, Instant};

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Poll `condition` every `poll` until it holds or `timeout` elapses.
/// The condition is checked once more at the deadline. Returns whether it
/// held.
pub fn wait_until<F>(timeout: Duration, poll: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(poll.min(deadline - now));
    }
}
