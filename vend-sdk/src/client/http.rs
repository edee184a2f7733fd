//! Request/response API client.

use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use super::{API_KEY_HEADER, ClientError};
use crate::objects::{ChannelAddress, PriceQuote, StatusSnapshot, VendForm};

/// Typed HTTP client for the vending machine API.
///
/// Every request carries the `X-Api-Key` header when an API key has been
/// set with [`with_api_key`](Self::with_api_key).
#[derive(Debug, Clone)]
pub struct VendClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl VendClient {
    /// Create a new `VendClient` for the server rooted at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key: None,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// `POST /api/vend` – ask the machine to vend from the addressed channel.
    ///
    /// A 2xx only means the request was accepted; the outcome of the vend
    /// itself is pushed later as `vendSuccess` or `vendError`. The response
    /// body is returned for diagnostics (`Null` if empty).
    pub async fn submit_vend(&self, form: &VendForm) -> Result<serde_json::Value, ClientError> {
        let url = self.base_url.join("/api/vend")?;

        let resp = self.request(Method::POST, url).form(form).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api { status, body });
        }
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(ClientError::Json)
    }

    /// `GET /api/channels/{addr}/price` – quote the price of a channel.
    pub async fn fetch_price(&self, address: &ChannelAddress) -> Result<PriceQuote, ClientError> {
        let url = self.base_url.join(&format!(
            "/api/channels/{}/price",
            urlencoding::encode(address.as_str())
        ))?;

        let resp = self.request(Method::GET, url).send().await?;

        parse_response(resp).await
    }

    /// `GET /api/status` – fetch the current machine status.
    pub async fn get_status(&self) -> Result<StatusSnapshot, ClientError> {
        let url = self.base_url.join("/api/status")?;

        let resp = self.request(Method::GET, url).send().await?;

        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
