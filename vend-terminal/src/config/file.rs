//! TOML file configuration structures.
//!
//! These structs directly map to the `vend-terminal.toml` file format.
//! Every section and field is optional.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Extra fields sent with every vend request.
    #[serde(default)]
    pub form: BTreeMap<String, String>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root URL of the vending machine server.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Push channel URL. Derived from `base_url` when absent.
    #[serde(default)]
    pub push_url: Option<Url>,
    /// Sent as `X-Api-Key` on every HTTP request.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            push_url: None,
            api_key: None,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("http://127.0.0.1:5000").expect("valid default url")
}

/// Timing section. All values are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Auto-dismiss delay for every banner category.
    #[serde(default = "default_banner_ms")]
    pub banner_ms: u64,
    pub error_banner_ms: Option<u64>,
    pub info_banner_ms: Option<u64>,
    pub success_banner_ms: Option<u64>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_reselect_delay_ms")]
    pub reselect_delay_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            banner_ms: default_banner_ms(),
            error_banner_ms: None,
            info_banner_ms: None,
            success_banner_ms: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reselect_delay_ms: default_reselect_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_banner_ms() -> u64 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_reselect_delay_ms() -> u64 {
    500
}

fn default_request_timeout_ms() -> u64 {
    10_000
}
