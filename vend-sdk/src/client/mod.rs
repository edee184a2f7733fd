//! HTTP and push-channel clients for the vending machine server.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest` or `tokio-tungstenite`.

mod http;
mod push;

pub use http::VendClient;
pub use push::{Inbound, PushClient, PushSession};
pub use reqwest::StatusCode;

/// Header carrying the API key, when one is configured.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Errors produced by the SDK clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The push connection failed after it was established.
    #[error("push channel error: {0}")]
    Push(#[from] tokio_tungstenite::tungstenite::Error),

    /// The push connection was not established in time.
    #[error("push channel connect timed out")]
    ConnectTimeout,
}

/// How a failed request ended, as far as the user is concerned.
///
/// Transport outcomes are listed before HTTP statuses: a request that never
/// produced a usable response is classified by what went wrong on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The request or connection timed out.
    Timeout,
    /// A response arrived but its body could not be parsed.
    Parse,
    /// The response was cut off before it was fully received.
    Abort,
    /// The server answered with a non-success status.
    Status { code: u16, body: String },
    /// Any other transport failure; the detail is the transport error text.
    Network(String),
}

impl ClientError {
    /// Classify this error.
    pub fn failure(&self) -> Failure {
        match self {
            ClientError::Http(e) if e.is_timeout() => Failure::Timeout,
            ClientError::Http(e) if e.is_decode() => Failure::Parse,
            ClientError::Http(e) if e.is_body() => Failure::Abort,
            ClientError::Http(e) => Failure::Network(e.to_string()),
            ClientError::Api { status, body } => Failure::Status {
                code: status.as_u16(),
                body: body.clone(),
            },
            ClientError::Json(_) => Failure::Parse,
            ClientError::Url(e) => Failure::Network(e.to_string()),
            ClientError::Push(e) => Failure::Network(e.to_string()),
            ClientError::ConnectTimeout => Failure::Timeout,
        }
    }
}
