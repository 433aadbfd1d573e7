use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local directory holding config files and the default database.
pub const CONFIG_DIR: &str = ".event-rules";

/// Prefix of environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "EVENT_RULES_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Scheduler queue name cannot be empty")]
    EmptyQueueName,

    #[error("Invalid tick_interval_secs: {0}. Must be at least 1")]
    InvalidTickInterval(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.event-rules/config.yaml`
    /// 3. `.event-rules/local.yaml`
    /// 4. `EVENT_RULES_*` environment variables
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new(CONFIG_DIR))
    }

    /// Same layering as [`load`](Self::load) rooted at `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.scheduler.queue_name.trim().is_empty() {
            return Err(ConfigError::EmptyQueueName);
        }
        if config.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::InvalidTickInterval(config.scheduler.tick_interval_secs));
        }

        Ok(())
    }

    /// YAML written by `event-rules init`.
    pub fn default_yaml() -> Result<String> {
        serde_yaml::to_string(&Config::default()).context("Failed to serialize default configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.database.path, ".event-rules/event-rules.db");
        assert_eq!(config.scheduler.queue_name, "rule_scheduler");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/rules.db
  max_connections: 2
logging:
  level: debug
  format: json
scheduler:
  queue_name: nightly
  tick_interval_secs: 300
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.database.path, "/custom/rules.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.retention_days, 30);
        assert_eq!(config.scheduler.queue_name, "nightly");
        assert_eq!(config.scheduler.tick_interval_secs, 300);
        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogFormat(_))));

        let mut config = Config::default();
        config.database.path = String::new();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabasePath)));

        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidMaxConnections(0))));

        let mut config = Config::default();
        config.scheduler.queue_name = "  ".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyQueueName)));

        let mut config = Config::default();
        config.scheduler.tick_interval_secs = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidTickInterval(0))));
    }

    #[test]
    fn test_hierarchical_merging() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "database:\n  path: base.db\nscheduler:\n  queue_name: base\n",
        )
        .unwrap();
        fs::write(dir.path().join("local.yaml"), "scheduler:\n  queue_name: local\n").unwrap();

        temp_env::with_vars(
            [
                ("EVENT_RULES_LOGGING__LEVEL", Some("debug")),
                ("EVENT_RULES_DATABASE__PATH", None::<&str>),
            ],
            || {
                let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
                assert_eq!(config.database.path, "base.db");
                assert_eq!(config.scheduler.queue_name, "local");
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_env_override_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "scheduler:\n  tick_interval_secs: 10\n").unwrap();

        temp_env::with_var("EVENT_RULES_SCHEDULER__TICK_INTERVAL_SECS", Some("15"), || {
            let config = ConfigLoader::load_from_file(&path).unwrap();
            assert_eq!(config.scheduler.tick_interval_secs, 15);
        });
    }

    #[test]
    fn test_invalid_file_value_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "logging:\n  format: xml\n").unwrap();
        assert!(ConfigLoader::load_from_dir(dir.path()).is_err());
    }
}
