//! Top-level driver: log in, poll forever, and route failures.
//!
//! ```text
//! LoggingIn --ok--> Polling --reading--> Polling (after a power-dependent pause)
//!     |                 |
//!     |                 +--NotAuthenticated--> LoggingIn
//!     +--SerialFailure--+--SerialFailure----> ResettingLink --> LoggingIn
//!     +--NotAuthenticated--> terminate
//! ```

use crate::api::transport::Transport;
use crate::api::{Client, Error};
use crate::display::DisplaySink;
use crate::link::Link;
use crate::model::{Credentials, PowerReading, Session};
use crate::status::{Status, StatusIndicator};
use std::convert::Infallible;
use std::time::Duration;

pub const SHORT_INTERVAL: Duration = Duration::from_secs(2 * 60);
pub const LONG_INTERVAL: Duration = Duration::from_secs(20 * 60);
pub const UNCLASSIFIED_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    LoggingIn,
    Polling(Session),
    ResettingLink,
}

/// What to do with an error that fits no other class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnclassifiedPolicy {
    Abort,
    /// Last resort: wait, reset the link and log in again.
    ResetAndRetry(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub minimum_power_threshold: i64,
    pub short_interval: Duration,
    pub long_interval: Duration,
}

impl Schedule {
    /// Poll often while producing, rarely when readings are near zero (overnight).
    pub fn next_poll(&self, reading: &PowerReading) -> Duration {
        if reading.watts >= self.minimum_power_threshold {
            self.short_interval
        } else {
            self.long_interval
        }
    }
}

pub struct Orchestrator<T, L, D, S> {
    client: Client<T>,
    link: L,
    display: D,
    status: S,
    credentials: Credentials,
    schedule: Schedule,
    unclassified: UnclassifiedPolicy,
    /// Plant id of the first successful login; fixed from then on.
    plant_id: Option<String>,
    state: State,
}

impl<T, L, D, S> Orchestrator<T, L, D, S>
where
    T: Transport,
    L: Link,
    D: DisplaySink,
    S: StatusIndicator,
{
    pub fn new(
        client: Client<T>,
        link: L,
        display: D,
        status: S,
        credentials: Credentials,
        schedule: Schedule,
        unclassified: UnclassifiedPolicy,
    ) -> Self {
        Orchestrator {
            client,
            link,
            display,
            status,
            credentials,
            schedule,
            unclassified,
            plant_id: None,
            state: State::LoggingIn,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Connect, then run the state machine until a fatal error.
    pub async fn run(mut self) -> Result<Infallible, Error> {
        self.link.connect().await;
        self.status.show(Status::Ready);
        loop {
            self.step().await?;
        }
    }

    /// Perform one transition. `Err` means the process should terminate.
    pub async fn step(&mut self) -> Result<(), Error> {
        let state = std::mem::replace(&mut self.state, State::LoggingIn);
        self.state = match state {
            State::LoggingIn => self.log_in().await?,
            State::Polling(session) => self.poll(session).await?,
            State::ResettingLink => {
                self.link.reset().await;
                State::LoggingIn
            }
        };
        Ok(())
    }

    async fn log_in(&mut self) -> Result<State, Error> {
        let result = self
            .client
            .login(
                &mut self.link,
                &self.status,
                &self.credentials,
                self.plant_id.as_deref(),
            )
            .await;

        match result {
            Ok(session) => {
                log::info!("Logged in, polling plant {}", session.plant_id);
                self.plant_id = Some(session.plant_id.clone());
                Ok(State::Polling(session))
            }
            Err(Error::NotAuthenticated(msg)) => {
                self.status.show(Status::Error);
                log::error!(
                    "Login unsuccessful ({}). Your account details might be wrong.",
                    msg
                );
                Err(Error::NotAuthenticated(msg))
            }
            Err(Error::SerialFailure { attempts, .. }) => {
                self.status.show(Status::Error);
                log::warn!(
                    "Login failed {} times in a row, resetting the link.",
                    attempts
                );
                Ok(State::ResettingLink)
            }
            Err(e) => self.handle_unclassified(e).await,
        }
    }

    async fn poll(&mut self, session: Session) -> Result<State, Error> {
        self.display.placeholder();
        let result = self
            .client
            .poll(&mut self.link, &self.status, &session)
            .await;

        match result {
            Ok(reading) => {
                self.display.render(&reading);
                self.status.show(Status::Ready);
                let pause = self.schedule.next_poll(&reading);
                log::debug!("{} W, next poll in {:?}", reading.watts, pause);
                tokio::time::sleep(pause).await;
                Ok(State::Polling(session))
            }
            Err(Error::NotAuthenticated(msg)) => {
                self.status.show(Status::Error);
                log::warn!("Seems like we are not logged in ({}). Logging in again.", msg);
                Ok(State::LoggingIn)
            }
            Err(Error::SerialFailure { attempts, .. }) => {
                self.status.show(Status::Error);
                log::warn!(
                    "Polling failed {} times in a row, resetting the link.",
                    attempts
                );
                Ok(State::ResettingLink)
            }
            Err(e) => self.handle_unclassified(e).await,
        }
    }

    async fn handle_unclassified(&mut self, error: Error) -> Result<State, Error> {
        self.status.show(Status::Error);
        match self.unclassified {
            UnclassifiedPolicy::Abort => {
                log::error!("Unknown failure: {}", error);
                Err(error)
            }
            UnclassifiedPolicy::ResetAndRetry(delay) => {
                log::warn!("Unknown failure: {}. Resetting the link and retrying.", error);
                tokio::time::sleep(delay).await;
                Ok(State::ResettingLink)
            }
        }
    }
}
