//! Configuration for HR Ops data access

use crate::database::{DatabasePoolConfig, MEMORY_DATABASE_URL};
use crate::error::{HrOpsError, Result};
use crate::models::{CompanyId, DepartmentId, UserId};
use crate::observability::ObservabilityConfig;
use crate::scope::IdentityContext;
use hrops_common::{get_default_database_path, DEFAULT_REQUEST_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Where the data lives and how the pool is sized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite connection string, e.g. `sqlite:///var/lib/hrops.sqlite`
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: format!("sqlite://{}", get_default_database_path().display()),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

impl DatabaseSettings {
    /// Settings for a private in-memory database
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: MEMORY_DATABASE_URL.to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Self::default()
        }
    }

    /// Whether `url` names an in-memory database
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// Pool configuration derived from these settings
    #[must_use]
    pub fn pool_config(&self) -> DatabasePoolConfig {
        let base = if self.is_memory() {
            DatabasePoolConfig::in_memory()
        } else {
            DatabasePoolConfig {
                max_connections: self.max_connections,
                min_connections: self.min_connections,
                ..DatabasePoolConfig::default()
            }
        };
        DatabasePoolConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            ..base
        }
    }
}

/// Behaviour of every entity accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessorSettings {
    /// Upper bound for one backend call
    pub request_timeout_ms: u64,
}

impl Default for AccessorSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl AccessorSettings {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Identity to start the session with (CLI and service use)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub department_id: Option<DepartmentId>,
}

impl IdentitySettings {
    #[must_use]
    pub const fn to_context(&self) -> IdentityContext {
        IdentityContext::new(self.company_id, self.user_id, self.department_id)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrOpsConfig {
    pub database: DatabaseSettings,
    pub accessor: AccessorSettings,
    pub identity: IdentitySettings,
    pub logging: ObservabilityConfig,
}

impl HrOpsConfig {
    /// Load configuration from a YAML (`.yaml`/`.yml`) or JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HrOpsError::Io(std::io::Error::other(format!(
                "Failed to read config file {}: {e}",
                path.display()
            )))
        })?;

        if is_yaml(path) {
            serde_yaml::from_str(&content)
                .map_err(|e| HrOpsError::configuration(format!("Failed to parse YAML config: {e}")))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| HrOpsError::configuration(format!("Failed to parse JSON config: {e}")))
        }
    }

    /// Save configuration as `"yaml"` or `"json"`
    ///
    /// # Errors
    /// Returns an error if the format is unknown or the file cannot be written
    pub fn to_file<P: AsRef<Path>>(&self, path: P, format: &str) -> Result<()> {
        let path = path.as_ref();
        let content = match format {
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| HrOpsError::configuration(format!("Failed to serialize YAML: {e}")))?,
            "json" => serde_json::to_string_pretty(self)?,
            _ => {
                return Err(HrOpsError::configuration(format!(
                    "Unsupported format: {format}"
                )))
            }
        };

        std::fs::write(path, content).map_err(|e| {
            HrOpsError::Io(std::io::Error::other(format!(
                "Failed to write config file {}: {e}",
                path.display()
            )))
        })
    }

    /// Apply `HROPS_*` environment overrides
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("HROPS_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(company_id) = env_parse("HROPS_COMPANY_ID")? {
            self.identity.company_id = Some(company_id);
        }
        if let Ok(user_id) = std::env::var("HROPS_USER_ID") {
            let user_id = UserId::parse_str(&user_id)
                .map_err(|_| HrOpsError::configuration("Invalid HROPS_USER_ID value"))?;
            self.identity.user_id = Some(user_id);
        }
        if let Some(department_id) = env_parse("HROPS_DEPARTMENT_ID")? {
            self.identity.department_id = Some(department_id);
        }
        if let Some(timeout) = env_parse("HROPS_REQUEST_TIMEOUT_MS")? {
            self.accessor.request_timeout_ms = timeout;
        }
        if let Ok(level) = std::env::var("HROPS_LOG_LEVEL") {
            self.logging.log_level = level.to_lowercase();
        }
        if let Ok(json_logs) = std::env::var("HROPS_JSON_LOGS") {
            self.logging.json_logs = parse_bool(&json_logs);
        }
        Ok(())
    }

    /// Configuration from defaults plus environment overrides
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay every field of `other` that differs from the defaults
    pub fn merge_with(&mut self, other: &Self) {
        let defaults = Self::default();

        if other.database.url != defaults.database.url {
            self.database.url.clone_from(&other.database.url);
        }
        if other.database.max_connections != defaults.database.max_connections {
            self.database.max_connections = other.database.max_connections;
        }
        if other.database.min_connections != defaults.database.min_connections {
            self.database.min_connections = other.database.min_connections;
        }
        if other.database.connect_timeout_secs != defaults.database.connect_timeout_secs {
            self.database.connect_timeout_secs = other.database.connect_timeout_secs;
        }
        if other.accessor != defaults.accessor {
            self.accessor = other.accessor;
        }
        if other.identity.company_id.is_some() {
            self.identity.company_id = other.identity.company_id;
        }
        if other.identity.user_id.is_some() {
            self.identity.user_id = other.identity.user_id;
        }
        if other.identity.department_id.is_some() {
            self.identity.department_id = other.identity.department_id;
        }
        if other.logging.log_level != defaults.logging.log_level {
            self.logging.log_level.clone_from(&other.logging.log_level);
        }
        if other.logging.json_logs {
            self.logging.json_logs = true;
        }
        if other.logging.service_name != defaults.logging.service_name {
            self.logging
                .service_name
                .clone_from(&other.logging.service_name);
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(HrOpsError::configuration("Database URL cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(HrOpsError::configuration(
                "Max connections must be greater than 0",
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(HrOpsError::configuration(
                "Min connections cannot exceed max connections",
            ));
        }
        if self.accessor.request_timeout_ms == 0 {
            return Err(HrOpsError::configuration(
                "Request timeout must be greater than 0",
            ));
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.log_level.as_str()) {
            return Err(HrOpsError::configuration(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    )
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HrOpsError::configuration(format!("Invalid {name} value"))),
        Err(_) => Ok(None),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
