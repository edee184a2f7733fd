//! Configuration module for vend-terminal.
//!
//! Handles loading configuration from a TOML file and applying CLI
//! overrides.

pub mod file;

use crate::config::file::FileConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use vend_core::config::{BannerDurations, ClientConfig};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Where the server lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub base_url: Url,
    pub push_url: Url,
    pub api_key: Option<String>,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerSettings,
    pub client: ClientConfig,
    pub form_fields: Vec<(String, String)>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    base_url_override: Option<Url>,
    push_url_override: Option<Url>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(
        config_path: impl AsRef<Path>,
        base_url_override: Option<Url>,
        push_url_override: Option<Url>,
    ) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            base_url_override,
            push_url_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file (a missing file means all defaults)
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = if self.config_path.exists() {
            let config_content = std::fs::read_to_string(&self.config_path)?;
            toml::from_str(&config_content)?
        } else {
            tracing::info!(
                "No config file at {:?}, using defaults",
                self.config_path
            );
            FileConfig::default()
        };

        if let Some(base_url) = &self.base_url_override {
            file_config.server.base_url = base_url.clone();
        }
        if let Some(push_url) = &self.push_url_override {
            file_config.server.push_url = Some(push_url.clone());
        }

        self.validate(&file_config)?;

        build_loaded_config(file_config)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let base_url = &config.server.base_url;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "server.base_url must be http or https, got {base_url}"
            )));
        }
        if let Some(push_url) = &config.server.push_url {
            if !matches!(push_url.scheme(), "ws" | "wss") {
                return Err(ConfigError::ValidationError(format!(
                    "server.push_url must be ws or wss, got {push_url}"
                )));
            }
        }

        let timing = &config.timing;
        let banner_values = [
            Some(timing.banner_ms),
            timing.error_banner_ms,
            timing.info_banner_ms,
            timing.success_banner_ms,
        ];
        if banner_values.into_iter().flatten().any(|ms| ms == 0) {
            return Err(ConfigError::ValidationError(
                "banner durations must be greater than zero".to_string(),
            ));
        }
        if timing.connect_timeout_ms == 0 || timing.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let push_url = match file_config.server.push_url {
        Some(url) => url,
        None => derive_push_url(&file_config.server.base_url)?,
    };

    let timing = file_config.timing;
    let banner = Duration::from_millis(timing.banner_ms);
    let or_banner = |ms: Option<u64>| ms.map(Duration::from_millis).unwrap_or(banner);

    Ok(LoadedConfig {
        server: ServerSettings {
            base_url: file_config.server.base_url,
            push_url,
            api_key: file_config.server.api_key,
        },
        client: ClientConfig {
            banners: BannerDurations {
                error: or_banner(timing.error_banner_ms),
                info: or_banner(timing.info_banner_ms),
                success: or_banner(timing.success_banner_ms),
            },
            connect_timeout: Duration::from_millis(timing.connect_timeout_ms),
            reconnect_delay: Duration::from_millis(timing.reconnect_delay_ms),
            reselect_delay: Duration::from_millis(timing.reselect_delay_ms),
            request_timeout: Duration::from_millis(timing.request_timeout_ms),
        },
        form_fields: file_config.form.into_iter().collect(),
    })
}

/// Push channel URL served next to the HTTP API: same host and port,
/// `ws`/`wss` scheme, path `/ws`.
pub fn derive_push_url(base_url: &Url) -> Result<Url, ConfigError> {
    let scheme = match base_url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let mut push_url = base_url.clone();
    push_url.set_scheme(scheme).map_err(|()| {
        ConfigError::ValidationError(format!("cannot derive push url from {base_url}"))
    })?;
    push_url.set_path("/ws");
    push_url.set_query(None);
    push_url.set_fragment(None);
    Ok(push_url)
}
