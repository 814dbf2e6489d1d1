//! Attempt loop shared by login and polling.
//!
//! Every attempt first checks the link. A down link is reconnected and the attempt is
//! retried at once; request and decoding failures wait a fixed delay. A call that fails
//! to connect only counts as a down link if the link check agrees afterwards. Either way
//! the attempt counts against the operation's budget, and running out of attempts turns
//! into [`Error::SerialFailure`]. Anything that is not retryable (a rejected login, an
//! expired session, an unclassified failure) is handed to the caller on first sight.

use crate::api::Error;
use crate::link::Link;
use crate::status::{Status, StatusIndicator};
use std::future::Future;
use std::time::Duration;

pub const LOGIN_ATTEMPTS: u32 = 2;
pub const POLL_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Bring the link back up and try again without waiting.
    Reconnect,
    /// Wait, then try again.
    Wait(Duration),
    /// Stop and hand this error to the caller.
    Raise(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryPolicy { attempts, delay }
    }

    /// What to do after `attempt` (1-based) of `operation` failed with `error`.
    pub fn decide(&self, operation: &'static str, attempt: u32, error: Error) -> Action {
        if !error.is_retryable() {
            return Action::Raise(error);
        }
        if attempt >= self.attempts {
            return Action::Raise(Error::SerialFailure {
                operation,
                attempts: attempt,
            });
        }
        match error {
            Error::LinkDown => Action::Reconnect,
            _ => Action::Wait(self.delay),
        }
    }

    /// Run `attempt` until it succeeds or `decide` says to stop.
    pub async fn run<T, L, S, F, Fut>(
        &self,
        operation: &'static str,
        link: &mut L,
        status: &S,
        mut attempt: F,
    ) -> Result<T, Error>
    where
        L: Link,
        S: StatusIndicator,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut n = 0;
        loop {
            n += 1;
            status.show(Status::Processing);
            log::info!("Trying {}, attempt {}", operation, n);

            let result = if link.is_connected().await {
                match attempt().await {
                    /* The call could not connect but the link itself is up */
                    Err(Error::LinkDown) if link.is_connected().await => Err(Error::Transport(
                        "could not connect to service".to_string(),
                    )),
                    result => result,
                }
            } else {
                Err(Error::LinkDown)
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            status.show(Status::Error);
            log::warn!("{} failed: {}", operation, error);

            match self.decide(operation, n, error) {
                Action::Reconnect => link.connect().await,
                Action::Wait(delay) => tokio::time::sleep(delay).await,
                Action::Raise(error) => {
                    if let Error::SerialFailure { .. } = error {
                        log::warn!("Giving up on {}", operation);
                    }
                    return Err(error);
                }
            }
        }
    }
}
