//! Configuration loading and environment variable handling

use crate::domains::GauntletConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "GAUNTLET".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<GauntletConfig> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        let mut config: GauntletConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<GauntletConfig> {
        let mut config = GauntletConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<GauntletConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut GauntletConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.targets)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_probe_overrides(&mut config.probe)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_output_overrides(&mut config.output)?;
        Ok(())
    }

    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::targets::TargetsConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("TARGET_A_URL") {
            config.backend_a.base_url = url;
        }

        if let Ok(url) = self.get_env_var("TARGET_B_URL") {
            config.backend_b.base_url = url;
        }

        Ok(())
    }

    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| self.env_error("HTTP_TIMEOUT", e))?;
            config.timeout = Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(verify_ssl) = self.get_env_var("HTTP_VERIFY_SSL") {
            config.verify_ssl = verify_ssl
                .parse()
                .map_err(|e| self.env_error("HTTP_VERIFY_SSL", e))?;
        }

        Ok(())
    }

    fn apply_probe_overrides(
        &self,
        config: &mut crate::domains::probe::ProbeConfig,
    ) -> ConfigResult<()> {
        if let Ok(seed) = self.get_env_var("PROBE_SEED") {
            let seed: u64 = seed
                .parse()
                .map_err(|e| self.env_error("PROBE_SEED", e))?;
            config.seed = Some(seed);
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| {
                    self.env_error("LOG_LEVEL", format!("unknown value '{}'", log_level))
                })?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| {
                    self.env_error("LOG_FORMAT", format!("unknown value '{}'", format))
                })?;
        }

        Ok(())
    }

    fn apply_output_overrides(
        &self,
        config: &mut crate::domains::output::OutputConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("OUTPUT_RESULTS_DIR") {
            config.results_dir = dir;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }

    fn env_error(&self, name: &str, reason: impl std::fmt::Display) -> ConfigError {
        ConfigError::EnvOverride {
            var: format!("{}_{}", self.prefix, name),
            message: reason.to_string(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
