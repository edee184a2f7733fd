//! Runtime configuration for the client.
//!
//! These are validated values. Loading them from a file is handled by the
//! binary crate.

use std::time::Duration;

use crate::state::BannerKind;

/// Banner lifetime used when nothing else is configured.
pub const DEFAULT_BANNER_DURATION: Duration = Duration::from_millis(5000);

/// Auto-dismiss duration per banner category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerDurations {
    pub error: Duration,
    pub info: Duration,
    pub success: Duration,
}

impl BannerDurations {
    /// Same duration for every category.
    pub fn uniform(duration: Duration) -> Self {
        Self {
            error: duration,
            info: duration,
            success: duration,
        }
    }

    pub fn for_kind(&self, kind: BannerKind) -> Duration {
        match kind {
            BannerKind::Error => self.error,
            BannerKind::Info => self.info,
            BannerKind::Success => self.success,
        }
    }
}

impl Default for BannerDurations {
    fn default() -> Self {
        Self::uniform(DEFAULT_BANNER_DURATION)
    }
}

/// Timing knobs shared by the request client and the push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub banners: BannerDurations,
    /// Push-channel handshake timeout.
    pub connect_timeout: Duration,
    /// Pause between push-channel reconnect attempts.
    pub reconnect_delay: Duration,
    /// Delay before the address input is re-selected after an interaction.
    pub reselect_delay: Duration,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            banners: BannerDurations::default(),
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(2),
            reselect_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
        }
    }
}
