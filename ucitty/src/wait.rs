//! Waiting on engine replies.
//!
//! The session forwards every raw output line into a channel; these helpers
//! read from it until a line of interest shows up.

use std::time::Duration;

use tokio::sync::mpsc;

/// Error type for reply wait operations.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timeout waiting for {0} after {1:?}")]
    Timeout(String, Duration),

    #[error("engine output closed while waiting for {0}")]
    Closed(String),
}

/// Wait for a line whose first token is `keyword`.
///
/// Lines that do not match are consumed and discarded. Returns the matching
/// line.
///
/// # Errors
///
/// Returns `WaitError::Timeout` if no matching line arrives within `timeout`,
/// and `WaitError::Closed` if the sending side goes away first.
pub async fn wait_for_keyword(
    lines: &mut mpsc::UnboundedReceiver<String>,
    keyword: &str,
    timeout: Duration,
) -> Result<String, WaitError> {
    let search = async {
        while let Some(line) = lines.recv().await {
            if line.split_whitespace().next() == Some(keyword) {
                return Ok(line);
            }
            tracing::trace!("Still waiting for {}: {}", keyword, line);
        }
        Err(WaitError::Closed(keyword.to_string()))
    };

    tokio::time::timeout(timeout, search)
        .await
        .map_err(|_| WaitError::Timeout(keyword.to_string(), timeout))?
}
