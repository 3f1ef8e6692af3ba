//! Configuration Loader
//!
//! Layers configuration files, then `HROPS_*` environment variables, then
//! validates the result.

use crate::config::HrOpsConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration loader that handles multiple sources with precedence
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base configuration
    base_config: HrOpsConfig,
    /// Configuration file paths to try in order; later files win
    config_paths: Vec<PathBuf>,
    /// Whether to load from environment variables
    load_from_env: bool,
    /// Whether to validate the final configuration
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_config: HrOpsConfig::default(),
            config_paths: Self::get_default_config_paths(),
            load_from_env: true,
            validate: true,
        }
    }

    /// Set the base configuration
    #[must_use]
    pub fn with_base_config(mut self, config: HrOpsConfig) -> Self {
        self.base_config = config;
        self
    }

    /// Add a configuration file path
    #[must_use]
    pub fn add_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Set configuration file paths
    #[must_use]
    pub fn with_config_paths<P: AsRef<Path>>(mut self, paths: Vec<P>) -> Self {
        self.config_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    /// Enable or disable loading from environment variables
    #[must_use]
    pub fn with_env_loading(mut self, enabled: bool) -> Self {
        self.load_from_env = enabled;
        self
    }

    /// Enable or disable configuration validation
    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Load configuration from all sources
    ///
    /// Unreadable files are skipped with a warning; a bad environment value
    /// or a failed validation is an error.
    ///
    /// # Errors
    /// Returns an error if an environment override is invalid or the final
    /// configuration does not validate
    pub fn load(&self) -> Result<HrOpsConfig> {
        let mut config = self.base_config.clone();
        debug!("Starting configuration loading process");

        for path in &self.config_paths {
            if !path.exists() {
                debug!("Configuration file not found: {}", path.display());
                continue;
            }
            match HrOpsConfig::from_file(path) {
                Ok(file_config) => {
                    config.merge_with(&file_config);
                    info!("Loaded configuration from: {}", path.display());
                }
                Err(e) => {
                    warn!(
                        "Failed to load configuration from {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        if self.load_from_env {
            debug!("Applying environment overrides");
            config.apply_env()?;
        }

        if self.validate {
            config.validate()?;
            debug!("Configuration validation passed");
        }

        Ok(config)
    }

    /// Get the default configuration file paths to try
    #[must_use]
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let user_dir = Self::get_user_config_dir();
        vec![
            user_dir.join("config.json"),
            user_dir.join("config.yaml"),
            user_dir.join("config.yml"),
            PathBuf::from("hrops.json"),
            PathBuf::from("hrops.yaml"),
            PathBuf::from("hrops.yml"),
        ]
    }

    /// Get the user configuration directory
    #[must_use]
    pub fn get_user_config_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join("hrops")
        } else if let Ok(userprofile) = std::env::var("USERPROFILE") {
            PathBuf::from(userprofile)
                .join("AppData")
                .join("Roaming")
                .join("hrops")
        } else {
            PathBuf::from("~/.config/hrops")
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from the default locations and the environment
///
/// # Errors
/// Returns an error if configuration cannot be loaded
pub fn load_config() -> Result<HrOpsConfig> {
    ConfigLoader::new().load()
}

/// Load configuration from one explicit file plus the environment
///
/// # Errors
/// Returns an error if configuration cannot be loaded
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<HrOpsConfig> {
    ConfigLoader::new().with_config_paths(vec![path]).load()
}
