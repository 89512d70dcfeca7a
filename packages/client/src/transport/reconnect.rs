//! Reconnection policy for the room event stream.
//!
//! Pure functions, no I/O, so the listener's decisions are easy to test.

use std::time::Duration;

use crate::error::ClientError;

/// Consecutive failed connection attempts tolerated before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Delay before reconnecting when the server did not send `retry:`
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            interval: RECONNECT_INTERVAL,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the next attempt, preferring the server's `retry:` value.
    pub fn delay(&self, server_retry: Option<Duration>) -> Duration {
        server_retry.unwrap_or(self.interval)
    }
}

/// Check if the subscription should give up immediately based on the error type.
///
/// A non-success status means the server refused the stream; reconnecting
/// would only get the same answer.
///
/// # Returns
///
/// `true` if the error is final (e.g., UnexpectedStatus), `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::UnexpectedStatus(_) | ClientError::MalformedEvent { .. }
    )
}

/// Check if the subscription should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The error of the last attempt
/// * `failed_attempts` - Consecutive failed attempts so far, the last one included
/// * `max_attempts` - The maximum number of consecutive failures tolerated
pub fn should_attempt_reconnect(error: &ClientError, failed_attempts: u32, max_attempts: u32) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    failed_attempts < max_attempts
}
