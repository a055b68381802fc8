// src/config/mod.rs
mod schema;

use std::path::{Path, PathBuf};
use config::{Config as ConfigLoader, FileFormat};
use tracing::{info, warn};

pub use schema::{
    Config, GlobalConfig, DispatchConfig, ExecutionMode, IdentityConfig,
    TemplateConfig, TemplateFamily, NotifyConfig
};

use crate::error::{DorkHuntResult, DorkHuntError};

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Centralized configuration handling
impl Config {
    /// Load configuration layered as: built-in defaults, user file, environment
    pub fn load(config_path: Option<&Path>) -> DorkHuntResult<Self> {
        info!("Loading configuration");

        let mut config_builder = ConfigLoader::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // User-provided configuration
        if let Some(path) = config_path {
            if path.exists() {
                config_builder = config_builder.add_source(config::File::from(path));
                info!("Loading user configuration from: {}", path.display());
            } else {
                warn!("Specified configuration file not found: {}", path.display());
            }
        } else {
            let default_path = Self::get_default_config_path();
            if default_path.exists() {
                config_builder = config_builder.add_source(config::File::from(default_path.as_path()));
                info!("Loading default configuration from: {}", default_path.display());
            } else {
                info!("No existing configuration found, using built-in defaults");
            }
        }

        // DORKHUNT_DISPATCH__MAX_CONCURRENCY=8 style overrides
        config_builder = config_builder.add_source(
            config::Environment::with_prefix("DORKHUNT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
        );

        let mut config: Config = config_builder
            .build()
            .map_err(|e| DorkHuntError::ConfigError(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| DorkHuntError::ConfigError(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// The embedded defaults only, without user files or environment
    pub fn builtin() -> DorkHuntResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Parse a complete configuration document
    pub fn from_toml_str(content: &str) -> DorkHuntResult<Self> {
        let mut config: Config = ConfigLoader::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| DorkHuntError::ConfigError(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Normalise values the pipeline relies on
    pub fn validate(&mut self) -> DorkHuntResult<()> {
        if self.identity.user_agents.is_empty() {
            return Err(DorkHuntError::ConfigError("identity.user_agents must not be empty".to_string()));
        }

        if self.dispatch.max_concurrency == 0 {
            warn!("dispatch.max_concurrency is 0, using 1");
            self.dispatch.max_concurrency = 1;
        }

        if self.dispatch.timeout_secs == 0 {
            warn!("dispatch.timeout_secs is 0, using 1");
            self.dispatch.timeout_secs = 1;
        }

        if self.identity.window_size == 0 {
            warn!("identity.window_size is 0, using 1");
            self.identity.window_size = 1;
        }

        if self.dispatch.min_delay_ms > self.dispatch.max_delay_ms {
            warn!(
                "dispatch.min_delay_ms ({}) exceeds max_delay_ms ({}), swapping",
                self.dispatch.min_delay_ms, self.dispatch.max_delay_ms
            );
            std::mem::swap(&mut self.dispatch.min_delay_ms, &mut self.dispatch.max_delay_ms);
        }

        if self.notify.max_message_len == 0 {
            return Err(DorkHuntError::ConfigError("notify.max_message_len must be positive".to_string()));
        }

        Ok(())
    }

    /// Get the default configuration path
    pub fn get_default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dorkhunt/config.toml")
    }

    /// Write the given configuration to the default location
    pub fn init(&self, force: bool) -> DorkHuntResult<PathBuf> {
        let config_path = Self::get_default_config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DorkHuntError::FileError {
                    path: parent.to_path_buf(),
                    message: format!("Failed to create directory: {}", e),
                })?;
        }

        if config_path.exists() && !force {
            return Err(DorkHuntError::ConfigError(
                format!("Configuration already exists at {}. Use --force to overwrite.", config_path.display())
            ));
        }

        self.save(&config_path)?;

        Ok(config_path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> DorkHuntResult<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| DorkHuntError::SerializationError(format!("Failed to serialize configuration: {}", e)))?;

        std::fs::write(path, config_str)
            .map_err(|e| DorkHuntError::FileError {
                path: path.to_path_buf(),
                message: format!("Failed to write configuration: {}", e),
            })?;

        info!("Configuration saved to {}", path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_parses() {
        let config = Config::builtin().unwrap();

        assert_eq!(config.dispatch.mode, ExecutionMode::Sequential);
        assert_eq!(config.dispatch.max_concurrency, 5);
        assert_eq!(config.identity.window_size, 10);
        assert!(config.identity.user_agents.len() >= 10);
        assert!(config.engines.contains_key("google"));
        assert_eq!(config.locales.get("us").map(String::as_str), Some("us"));
        assert!(config.templates.iter().any(|t| t.family == TemplateFamily::Deep));
        assert!(config.notify.webhook_url.is_none());
    }

    #[test]
    fn test_validate_normalises_dispatch() {
        let mut config = Config::builtin().unwrap();
        config.dispatch.max_concurrency = 0;
        config.dispatch.min_delay_ms = 500;
        config.dispatch.max_delay_ms = 100;
        config.identity.window_size = 0;
        config.dispatch.timeout_secs = 0;

        config.validate().unwrap();

        assert_eq!(config.dispatch.max_concurrency, 1);
        assert_eq!(config.dispatch.min_delay_ms, 100);
        assert_eq!(config.dispatch.max_delay_ms, 500);
        assert_eq!(config.identity.window_size, 1);
        assert_eq!(config.dispatch.timeout_secs, 1);
    }

    #[test]
    fn test_empty_identity_pool_rejected() {
        let mut config = Config::builtin().unwrap();
        config.identity.user_agents.clear();

        assert!(matches!(config.validate(), Err(DorkHuntError::ConfigError(_))));
    }

    #[test]
    fn test_save_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::builtin().unwrap();
        config.dispatch.max_concurrency = 9;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.dispatch.max_concurrency, 9);
        assert_eq!(loaded.templates, config.templates);
    }
}
