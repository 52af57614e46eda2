//! Process configuration for the board binary.

use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use crate::feed::FeedConfig;
use crate::scheduler::DEFAULT_REFRESH_PERIOD;

const DEFAULT_SETTINGS_PATH: &str = "departure-board-settings.json";

/// How often the "last updated" text is re-rendered.
pub const ELAPSED_TICK_PERIOD: Duration = Duration::from_millis(500);

pub const SETTINGS_PATH_VAR: &str = "BOARD_SETTINGS_PATH";
pub const FEED_URL_VAR: &str = "BOARD_FEED_URL";
pub const REFRESH_SECS_VAR: &str = "BOARD_REFRESH_SECS";
pub const MOCK_DATA_VAR: &str = "BOARD_MOCK_DATA";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOARD_REFRESH_SECS must be a whole number of seconds, got {value:?}")]
    InvalidRefreshSecs {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("BOARD_REFRESH_SECS must be at least 1")]
    ZeroRefresh,
}

/// Configuration for the board process.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Where the settings document lives.
    pub settings_path: PathBuf,

    /// Feed client settings.
    pub feed: FeedConfig,

    /// Time between refresh cycles.
    pub refresh_period: Duration,

    /// Serve departures from this fixture directory instead of the network.
    pub mock_data: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            feed: FeedConfig::default(),
            refresh_period: DEFAULT_REFRESH_PERIOD,
            mock_data: None,
        }
    }
}

impl BoardConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from a variable lookup. Unset and empty variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = var(SETTINGS_PATH_VAR) {
            config.settings_path = PathBuf::from(path);
        }
        if let Some(url) = var(FEED_URL_VAR) {
            config.feed = config.feed.with_base_url(url.trim_end_matches('/'));
        }
        if let Some(secs) = var(REFRESH_SECS_VAR) {
            config.refresh_period = parse_refresh_secs(&secs)?;
        }
        config.mock_data = var(MOCK_DATA_VAR).map(PathBuf::from);

        Ok(config)
    }
}

fn parse_refresh_secs(value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidRefreshSecs {
            value: value.to_string(),
            source,
        })?;
    if secs == 0 {
        return Err(ConfigError::ZeroRefresh);
    }
    Ok(Duration::from_secs(secs))
}
