mod database;
mod migrations;

pub use database::DatabaseConfig;
pub use migrations::MigrationsConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, StrataError};
use crate::migration::ContextKey;

/// Root configuration, loaded from `strata.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// Migration catalog and history configuration.
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

impl StrataConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StrataError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| StrataError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Configuration with defaults and the given database URL.
    pub fn default_with_database_url(url: &str) -> Self {
        Self {
            project: ProjectConfig::default(),
            database: DatabaseConfig {
                url: url.to_string(),
                ..Default::default()
            },
            migrations: MigrationsConfig::default(),
        }
    }

    /// Context key for the history table: the configured key, else the project name.
    pub fn context_key(&self) -> Result<ContextKey> {
        let raw = self
            .migrations
            .context_key
            .as_deref()
            .unwrap_or(&self.project.name);

        ContextKey::new(raw)
            .map_err(|_| StrataError::Config("migrations.context_key must not be blank".into()))
    }
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "strata-app".to_string()
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
        return content.to_string();
    };

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
