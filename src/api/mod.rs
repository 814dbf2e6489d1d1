pub mod endpoint;
pub mod error;
pub mod response;
pub mod transport;

use crate::link::Link;
use crate::model;
use crate::retry::RetryPolicy;
use crate::status::{Status, StatusIndicator};
pub use error::Error;
use md5::{Digest, Md5};
use response::device_list::DeviceList;
use response::login::Login;
use transport::Transport;

pub const API_URL: &str = "https://server-api.growatt.com/";

/// Encode `password` the way the login endpoint expects it: lowercase hex MD5 digest,
/// with every `0` at an even offset replaced by `c`.
pub fn hash_password(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
        .char_indices()
        .map(|(i, c)| if i % 2 == 0 && c == '0' { 'c' } else { c })
        .collect()
}

/// Growatt session client. Each operation runs its own attempt loop under the
/// corresponding `RetryPolicy`.
#[derive(Debug, Clone)]
pub struct Client<T> {
    api_url: String,
    transport: T,
    login_policy: RetryPolicy,
    poll_policy: RetryPolicy,
}

impl<T: Transport> Client<T> {
    pub fn new(
        api_url: String,
        transport: T,
        login_policy: RetryPolicy,
        poll_policy: RetryPolicy,
    ) -> Self {
        Client {
            api_url,
            transport,
            login_policy,
            poll_policy,
        }
    }

    /// Log in with `credentials`. An explicit `plant_id` wins over the one in
    /// `credentials`; without either, the account's first plant is used.
    pub async fn login<L: Link, S: StatusIndicator>(
        &self,
        link: &mut L,
        status: &S,
        credentials: &model::Credentials,
        plant_id: Option<&str>,
    ) -> Result<model::Session, Error> {
        let password = hash_password(&credentials.password);
        let plant_id = plant_id.or(credentials.plant_id.as_deref());
        if let Some(plant_id) = plant_id {
            log::info!("Using plant {}", plant_id);
        }

        self.login_policy
            .run("login", link, status, || {
                self.try_login(status, &credentials.username, &password, plant_id)
            })
            .await
    }

    async fn try_login<S: StatusIndicator>(
        &self,
        status: &S,
        username: &str,
        password: &str,
        plant_id: Option<&str>,
    ) -> Result<model::Session, Error> {
        let url = endpoint::url(&self.api_url, endpoint::LOGIN);
        let form = [("userName", username), ("password", password)];

        status.show(Status::InFlight);
        let response = self.transport.post_form(&url, &form).await;
        status.show(Status::Processing);
        let response = response?;

        let back = serde_json::from_str::<Login>(&response.body)?.back;
        if !back.success {
            log::warn!("Login rejected: {}", back.msg.as_deref().unwrap_or("no message"));
            return Err(Error::NotAuthenticated(
                back.msg.unwrap_or_else(|| "login rejected".to_string()),
            ));
        }

        let plant_id = match plant_id {
            Some(plant_id) => plant_id.to_string(),
            None => {
                let plant = back.data.into_iter().next().ok_or_else(|| {
                    Error::Unclassified("Account has no plants".to_string())
                })?;
                log::info!("No plant specified, defaulting to {}", plant.plant_id.0);
                plant.plant_id.0
            }
        };

        let cookie = response
            .cookie_header()
            .ok_or_else(|| Error::Unclassified("No session cookie received".to_string()))?;

        let account = back.user.map(|user| model::Account {
            id: user.id.0,
            right_level: user.rightlevel.0,
        });
        if let Some(account) = &account {
            log::debug!("Logged in as user {} (level {})", account.id, account.right_level);
        }

        Ok(model::Session {
            cookie,
            plant_id,
            account,
        })
    }

    /// Read the current power of the first device of the session's plant.
    pub async fn poll<L: Link, S: StatusIndicator>(
        &self,
        link: &mut L,
        status: &S,
        session: &model::Session,
    ) -> Result<model::PowerReading, Error> {
        self.poll_policy
            .run("poll", link, status, || self.try_poll(status, session))
            .await
    }

    async fn try_poll<S: StatusIndicator>(
        &self,
        status: &S,
        session: &model::Session,
    ) -> Result<model::PowerReading, Error> {
        let url = endpoint::device_list(&self.api_url, &session.plant_id);

        status.show(Status::InFlight);
        let raw = self.transport.get(&url, &session.cookie).await;
        status.show(Status::Processing);
        let raw = raw?;

        /* Session expiry shows up as a non-200 status here, not as a body flag */
        if raw.status != http::StatusCode::OK {
            log::warn!("Device list request answered {}", raw.status);
            return Err(Error::NotAuthenticated(format!(
                "device list request answered {}",
                raw.status
            )));
        }

        let device = serde_json::from_str::<DeviceList>(&raw.body)?
            .device_list
            .into_iter()
            .next()
            .ok_or_else(|| Error::Transport("No device in device list".to_string()))?;

        response::parse_power(&device.power)
            .map(|watts| model::PowerReading { watts })
            .map_err(Error::Transport)
    }
}
