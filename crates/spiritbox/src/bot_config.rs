//! Bot configuration loading.

use serde::Deserialize;
use spiritbox_error::{ConfigError, ConfigResult};
use spiritbox_leveling::PipelineConfig;

/// Top-level bot configuration.
///
/// Loaded from an optional TOML file plus `SPIRITBOX_`-prefixed
/// environment overrides; the database URL itself stays in
/// `DATABASE_URL` per the persistence layer's convention.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Connection pool bound
    pub database_pool_size: u32,
    /// Seconds between counted messages per member
    pub cooldown_secs: u64,
    /// Inclusive lower bound of the base XP roll
    pub base_xp_min: i64,
    /// Inclusive upper bound of the base XP roll
    pub base_xp_max: i64,
    /// Profile cache entry lifetime in seconds
    pub cache_ttl_secs: u64,
    /// Profile cache bound
    pub cache_max_size: usize,
    /// Seconds between catalog refreshes
    pub catalog_refresh_secs: u64,
    /// Emit logs as JSON instead of human-readable lines
    pub json_logs: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            database_pool_size: 10,
            cooldown_secs: 60,
            base_xp_min: 15,
            base_xp_max: 25,
            cache_ttl_secs: 300,
            cache_max_size: 5_000,
            catalog_refresh_secs: 900,
            json_logs: false,
        }
    }
}

impl BotConfig {
    /// Load configuration from `path` (optional) and the environment.
    pub fn load(path: Option<&str>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder =
            builder.add_source(config::Environment::with_prefix("SPIRITBOX").try_parsing(true));

        let loaded = builder
            .build()
            .map_err(|e| ConfigError::new(e.to_string()))?;
        let config: BotConfig = loaded
            .try_deserialize()
            .map_err(|e| ConfigError::new(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.base_xp_min <= 0 || self.base_xp_max < self.base_xp_min {
            return Err(ConfigError::new(format!(
                "base XP range [{}, {}] is invalid",
                self.base_xp_min, self.base_xp_max
            )));
        }
        if self.database_pool_size == 0 {
            return Err(ConfigError::new("database_pool_size must be positive"));
        }
        Ok(())
    }

    /// Pipeline knobs derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_cooldown_secs(self.cooldown_secs)
            .with_base_xp_range(self.base_xp_min, self.base_xp_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = BotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cooldown_secs, 60);
    }

    #[test]
    fn test_inverted_xp_range_rejected() {
        let config = BotConfig {
            base_xp_min: 25,
            base_xp_max: 15,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
