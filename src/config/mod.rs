//! Configuration management for Fairroll
//!
//! Configuration is read from a TOML file (or built from defaults), then
//! overridden from `FAIRROLL_*` environment variables, then validated.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::sampler::DEFAULT_MAX_DRAWS;
use crate::protocol::Variant;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub protocol: ProtocolConfig,
    pub dealer: DealerConfig,
    pub logging: LoggingConfig,
}

/// Client-side protocol settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub variant: Variant,
    /// Upper bound on each exchange with the house
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Consecutive rejected bytes before the die sampler gives up
    pub max_redraws: u32,
}

/// House-side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealerConfig {
    /// Rounds whose counter-move arrives later than this complete as EXPIRED
    #[serde(with = "humantime_serde")]
    pub round_expiry: Duration,
    pub history_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Derived,
            request_timeout: Duration::from_secs(10),
            max_redraws: DEFAULT_MAX_DRAWS,
        }
    }
}

impl Default for DealerConfig {
    fn default() -> Self {
        Self {
            round_expiry: Duration::from_secs(60),
            history_limit: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `path` if given, else defaults; then apply the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        config.override_from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Override configuration with environment variables
    fn override_from_env(&mut self) -> Result<()> {
        if let Ok(val) = env::var("FAIRROLL_VARIANT") {
            self.protocol.variant = val
                .parse()
                .map_err(|_| Error::Config(format!("Invalid protocol variant: {}", val)))?;
        }

        if let Ok(val) = env::var("FAIRROLL_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = val
                .parse()
                .map_err(|_| Error::Config("Invalid request timeout".to_string()))?;
            self.protocol.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = env::var("FAIRROLL_ROUND_EXPIRY_SECS") {
            let secs: u64 = val
                .parse()
                .map_err(|_| Error::Config("Invalid round expiry".to_string()))?;
            self.dealer.round_expiry = Duration::from_secs(secs);
        }

        if let Ok(val) = env::var("FAIRROLL_LOG_LEVEL") {
            self.logging.level = val;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.protocol.request_timeout.is_zero() {
            return Err(Error::Config("Request timeout must be > 0".to_string()));
        }

        if self.protocol.max_redraws == 0 {
            return Err(Error::Config("Max redraws must be > 0".to_string()));
        }

        if self.dealer.round_expiry.is_zero() {
            return Err(Error::Config("Round expiry must be > 0".to_string()));
        }

        if self.dealer.history_limit == 0 {
            return Err(Error::Config("History limit must be >= 1".to_string()));
        }

        if self.logging.level.trim().is_empty() {
            return Err(Error::Config("Log level cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.protocol.variant, Variant::Derived);
        assert_eq!(config.dealer.round_expiry, Duration::from_secs(60));
        assert_eq!(config.dealer.history_limit, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fairroll.toml");
        fs::write(
            &path,
            "[protocol]\nvariant = \"guess\"\nrequest_timeout = \"3s\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.protocol.variant, Variant::Guess);
        assert_eq!(config.protocol.request_timeout, Duration::from_secs(3));
        assert_eq!(config.dealer, DealerConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = Config::default();
        config.dealer.round_expiry = Duration::from_secs(90);

        config.save(&path).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.protocol.request_timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.dealer.history_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_variant_fails_to_parse() {
        let result = toml::from_str::<Config>("[protocol]\nvariant = \"roulette\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Config::load_from_file(Path::new("/nonexistent/fairroll.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
