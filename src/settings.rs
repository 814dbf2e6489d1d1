use crate::api::{Error, API_URL};
use crate::display::MINIMUM_POWER_THRESHOLD;
use crate::link::RECONNECT_DELAY;
use crate::model::Credentials;
use crate::orchestrator::{
    Schedule, UnclassifiedPolicy, LONG_INTERVAL, SHORT_INTERVAL, UNCLASSIFIED_DELAY,
};
use crate::retry::RETRY_DELAY;
use config::Config;
use std::time::Duration;

const ENV_PREFIX: &str = "GROWATT";
const CONFIG_FILE: &str = "growatt";

#[derive(Clone, serde::Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub username: String,
    pub password: String,
    pub plant_id: Option<String>,
    /// `host:port` probed to decide whether the link is up. Derived from `api_url`
    /// when unset.
    pub probe_addr: Option<String>,
    /// Shell command run on a hard link reset.
    pub link_reset_command: Option<String>,
    pub minimum_power_threshold: i64,
    pub short_interval_secs: u64,
    pub long_interval_secs: u64,
    pub retry_delay_secs: u64,
    pub reconnect_delay_secs: u64,
    pub retry_after_any_error: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("plant_id", &self.plant_id)
            .field("probe_addr", &self.probe_addr)
            .field("link_reset_command", &self.link_reset_command)
            .field("minimum_power_threshold", &self.minimum_power_threshold)
            .field("short_interval_secs", &self.short_interval_secs)
            .field("long_interval_secs", &self.long_interval_secs)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("reconnect_delay_secs", &self.reconnect_delay_secs)
            .field("retry_after_any_error", &self.retry_after_any_error)
            .finish()
    }
}

fn secs(duration: Duration) -> i64 {
    duration.as_secs() as i64
}

fn with_defaults(settings: &mut Config) -> Result<&mut Config, config::ConfigError> {
    settings
        .set_default("api_url", API_URL)?
        .set_default("minimum_power_threshold", MINIMUM_POWER_THRESHOLD)?
        .set_default("short_interval_secs", secs(SHORT_INTERVAL))?
        .set_default("long_interval_secs", secs(LONG_INTERVAL))?
        .set_default("retry_delay_secs", secs(RETRY_DELAY))?
        .set_default("reconnect_delay_secs", secs(RECONNECT_DELAY))?
        .set_default("retry_after_any_error", false)
}

/// Read settings from an optional `growatt.toml` and `GROWATT_*` environment variables.
pub fn read_settings() -> Result<Settings, Error> {
    let mut settings = Config::default();
    settings
        .merge(config::File::with_name(CONFIG_FILE).required(false))?
        .merge(config::Environment::with_prefix(ENV_PREFIX))?;
    Settings::from_config(settings)
}

impl Settings {
    pub fn from_config(mut settings: Config) -> Result<Settings, Error> {
        with_defaults(&mut settings)?;
        let settings = settings.try_into::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), Error> {
        for (key, value) in [("username", &self.username), ("password", &self.password)] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
        }
        if self.plant_id.as_deref().map_or(false, |p| p.trim().is_empty()) {
            return Err(Error::Config("plant_id must not be empty".to_string()));
        }
        self.probe_target().map(|_| ())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            plant_id: self.plant_id.clone(),
        }
    }

    /// `probe_addr`, or the host and port of `api_url`.
    pub fn probe_target(&self) -> Result<String, Error> {
        if let Some(addr) = &self.probe_addr {
            return Ok(addr.clone());
        }
        let url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| Error::Config(format!("invalid api_url {}: {}", self.api_url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("api_url {} has no host", self.api_url)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::Config(format!("api_url {} has no port", self.api_url)))?;
        Ok(format!("{}:{}", host, port))
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            minimum_power_threshold: self.minimum_power_threshold,
            short_interval: Duration::from_secs(self.short_interval_secs),
            long_interval: Duration::from_secs(self.long_interval_secs),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn unclassified_policy(&self) -> UnclassifiedPolicy {
        if self.retry_after_any_error {
            UnclassifiedPolicy::ResetAndRetry(UNCLASSIFIED_DELAY)
        } else {
            UnclassifiedPolicy::Abort
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let mut config = Config::default();
        for (key, value) in pairs {
            config.set(key, *value).unwrap();
        }
        config
    }

    #[test]
    fn defaults() {
        let settings =
            Settings::from_config(config(&[("username", "someone"), ("password", "secret")]))
                .unwrap();

        assert_eq!(API_URL, settings.api_url);
        assert_eq!(None, settings.plant_id);
        assert_eq!(
            Schedule {
                minimum_power_threshold: 10,
                short_interval: Duration::from_secs(120),
                long_interval: Duration::from_secs(1200),
            },
            settings.schedule()
        );
        assert_eq!(Duration::from_secs(20), settings.retry_delay());
        assert_eq!(UnclassifiedPolicy::Abort, settings.unclassified_policy());
        assert_eq!("server-api.growatt.com:443", settings.probe_target().unwrap());
    }

    #[test]
    fn overrides() {
        let settings = Settings::from_config(config(&[
            ("username", "someone"),
            ("password", "secret"),
            ("plant_id", "PLANT123"),
            ("api_url", "http://localhost:8080/"),
            ("minimum_power_threshold", "50"),
            ("retry_after_any_error", "true"),
        ]))
        .unwrap();

        assert_eq!(Some("PLANT123".to_string()), settings.credentials().plant_id);
        assert_eq!(50, settings.schedule().minimum_power_threshold);
        assert_eq!("localhost:8080", settings.probe_target().unwrap());
        assert_eq!(
            UnclassifiedPolicy::ResetAndRetry(UNCLASSIFIED_DELAY),
            settings.unclassified_policy()
        );
    }

    #[test]
    fn missing_credentials_are_fatal() {
        assert!(matches!(
            Settings::from_config(config(&[("username", "someone")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Settings::from_config(config(&[("username", " "), ("password", "secret")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn invalid_api_url_is_fatal() {
        assert!(matches!(
            Settings::from_config(config(&[
                ("username", "someone"),
                ("password", "secret"),
                ("api_url", "not a url"),
            ])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn password_not_in_debug_output() {
        let settings =
            Settings::from_config(config(&[("username", "someone"), ("password", "hunter2")]))
                .unwrap();
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
