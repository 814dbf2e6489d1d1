use crate::model::ConnectivityState;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connectivity to the service host.
pub trait Link {
    /// Bounded check of the link; updates the connectivity state.
    fn is_connected(&mut self) -> impl Future<Output = bool>;

    /// Block until the link is up. Never gives up.
    fn connect(&mut self) -> impl Future<Output = ()>;

    /// Hard reset of the link, followed by `connect()`.
    fn reset(&mut self) -> impl Future<Output = ()>;
}

/// Treats the link as up when a TCP connection to `target` can be opened.
#[derive(Debug, Clone)]
pub struct ProbeLink {
    target: String,
    timeout: Duration,
    reconnect_delay: Duration,
    reset_command: Option<String>,
    state: ConnectivityState,
}

impl ProbeLink {
    pub fn new(target: String, reconnect_delay: Duration, reset_command: Option<String>) -> Self {
        ProbeLink {
            target,
            timeout: PROBE_TIMEOUT,
            reconnect_delay,
            reset_command,
            state: ConnectivityState::default(),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    async fn probe(&self) -> Result<(), String> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("no answer within {:?}", self.timeout)),
        }
    }

    async fn run_reset_command(command: &str) {
        log::info!("Running link reset command: {}", command);
        match Command::new("sh").arg("-c").arg(command).status().await {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("Link reset command exited with {}", status),
            Err(e) => log::warn!("Unable to run link reset command: {}", e),
        }
    }
}

impl Link for ProbeLink {
    async fn is_connected(&mut self) -> bool {
        let result = self.probe().await;
        if let Err(e) = &result {
            log::debug!("{} unreachable: {}", self.target, e);
        }
        self.state.connected = result.is_ok();
        self.state.connected
    }

    async fn connect(&mut self) {
        log::info!("Connecting to {}...", self.target);
        loop {
            match self.probe().await {
                Ok(()) => break,
                Err(e) => {
                    self.state.connected = false;
                    log::warn!("Could not connect to {}, retrying: {}", self.target, e);
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
        self.state.connected = true;
        log::info!("Connected to {}", self.target);
    }

    async fn reset(&mut self) {
        log::warn!("Initiated link reset.");
        if let Some(command) = &self.reset_command {
            Self::run_reset_command(command).await;
        }
        self.state.connected = false;
        self.connect().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn reachable_target_is_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();
        let mut link = ProbeLink::new(target, Duration::ZERO, None);

        assert!(!link.state().connected);
        assert!(link.is_connected().await);
        assert!(link.state().connected);
    }

    #[tokio::test]
    async fn closed_port_is_not_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();
        drop(listener);
        let mut link = ProbeLink::new(target, Duration::ZERO, None);

        assert!(!link.is_connected().await);
        assert!(!link.state().connected);
    }

    #[tokio::test]
    async fn reset_runs_command_then_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();
        let mut link = ProbeLink::new(target, Duration::ZERO, Some("exit 3".to_string()));

        link.reset().await;
        assert!(link.state().connected);
    }
}
