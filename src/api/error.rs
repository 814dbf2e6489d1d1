#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The link to the service host is down.
    #[error("link not connected")]
    LinkDown,
    /// Request or response decoding failed; worth another attempt.
    #[error("request failed: {0}")]
    Transport(String),
    /// Credentials were rejected, or the session is no longer valid.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),
    /// The link looks fine but `operation` kept failing.
    #[error("{operation} failed {attempts} times in a row")]
    SerialFailure {
        operation: &'static str,
        attempts: u32,
    },
    #[error("unclassified failure: {0}")]
    Unclassified(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Errors handled inside an operation's attempt loop. Everything else is for the
    /// orchestrator to route.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LinkDown | Error::Transport(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Error::LinkDown
        } else {
            Error::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Transport(format!("Invalid API response: {}", error))
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Config(error.to_string())
    }
}
