use super::Error;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use std::future::Future;

const USER_AGENT: &str = "growatt-rs";

/// Fully read response. Nothing of the underlying connection outlives it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    /// `name=value` part of every `set-cookie` header, in order.
    pub cookies: Vec<String>,
    pub body: String,
}

impl RawResponse {
    /// Value for a `Cookie` request header, if the server set any cookie.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            None
        } else {
            Some(self.cookies.join("; "))
        }
    }
}

pub trait Transport {
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> impl Future<Output = Result<RawResponse, Error>>;

    fn get(&self, url: &str, cookie: &str) -> impl Future<Output = Result<RawResponse, Error>>;
}

/// The service rejects requests missing any of these.
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

fn cookie_pairs(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::ClientBuilder::new()
            .default_headers(default_headers())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::Unclassified(format!("Unable to build HTTP client: {}", e)))?;
        Ok(HttpTransport { client })
    }

    async fn read(request: reqwest::RequestBuilder) -> Result<RawResponse, Error> {
        let response = request.send().await?;
        let status = response.status();
        let cookies = cookie_pairs(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Error reading API response: {}", e)))?;

        log::trace!("status: {}, cookies: {:?}, body: {}", status, cookies, body);

        Ok(RawResponse {
            status,
            cookies,
            body,
        })
    }
}

impl Transport for HttpTransport {
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<RawResponse, Error> {
        let request = self
            .client
            .post(url)
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .form(form);
        Self::read(request).await
    }

    async fn get(&self, url: &str, cookie: &str) -> Result<RawResponse, Error> {
        let request = self.client.get(url).header(header::COOKIE, cookie);
        Self::read(request).await
    }
}
