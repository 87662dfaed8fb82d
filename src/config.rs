//! Aggregate configuration with environment overrides.

use std::str::FromStr;
use std::time::Duration;

use crate::compose::LegFetchMode;
use crate::error::ConfigError;
use crate::osrm::OsrmConfig;
use crate::refresher::RefreshOptions;
use crate::registry::RegistryConfig;

#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub osrm: OsrmConfig,
    pub registry: RegistryConfig,
    pub refresh: RefreshOptions,
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlays values found through `lookup` onto the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BIN_REGISTRY_URL") {
            config.registry.base_url = url;
        }
        if let Some(token) = lookup("BIN_REGISTRY_TOKEN") {
            config.registry.auth_token = Some(token);
        }
        if let Some(url) = lookup("OSRM_BASE_URL") {
            config.osrm.base_url = url;
        }
        if let Some(profile) = lookup("OSRM_PROFILE") {
            config.osrm.profile = profile;
        }
        if let Some(secs) = parse(&lookup, "OSRM_TIMEOUT_SECS")? {
            config.osrm.timeout_secs = secs;
        }
        if let Some(secs) = parse::<u64, _>(&lookup, "BIN_REFRESH_SECS")? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "BIN_REFRESH_SECS",
                    value: secs.to_string(),
                });
            }
            config.refresh.bin_refresh_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "MIN_RECOMPUTE_MS")? {
            config.refresh.min_recompute_interval = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(mode) = lookup("LEG_FETCH_MODE") {
            config.refresh.plan.fetch_mode = match mode.as_str() {
                "concurrent" => LegFetchMode::Concurrent,
                "sequential" => LegFetchMode::Sequential,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "LEG_FETCH_MODE",
                        value: mode,
                    });
                }
            };
        }

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(None),
    }
}
