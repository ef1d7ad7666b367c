use serde::{Deserialize, Serialize};

/// Where migrations live and how they are tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Directory holding migration and snapshot artifacts.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// TOML file describing the live schema model.
    #[serde(default = "default_model")]
    pub model: String,

    /// History context key. Defaults to the project name.
    #[serde(default)]
    pub context_key: Option<String>,

    /// Hold a database advisory lock for the duration of an upgrade.
    #[serde(default = "default_advisory_lock")]
    pub advisory_lock: bool,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            model: default_model(),
            context_key: None,
            advisory_lock: default_advisory_lock(),
        }
    }
}

fn default_directory() -> String {
    "migrations".to_string()
}

fn default_model() -> String {
    "schema.toml".to_string()
}

fn default_advisory_lock() -> bool {
    true
}
