use thiserror::Error;

/// Core error type for strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The migration catalog is ambiguous or malformed.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// A caller-supplied migration name failed validation.
    #[error("Invalid migration name: {0}")]
    InvalidName(String),

    /// The history table already holds this `(name, context_key)` pair.
    #[error("Migration '{name}' is already recorded for context '{context_key}'")]
    DuplicateMigration { name: String, context_key: String },

    /// Statements of a migration failed to execute.
    #[error("Failed to apply migration '{migration}': {source}")]
    Execution {
        migration: String,
        #[source]
        source: Box<StrataError>,
    },

    #[error("Scaffolding error: {0}")]
    Scaffold(String),

    #[error("Migration lock error: {0}")]
    Lock(String),
}

impl StrataError {
    /// Name of the migration an execution error belongs to.
    pub fn failed_migration(&self) -> Option<&str> {
        match self {
            StrataError::Execution { migration, .. } => Some(migration),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}

/// Result type alias using StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;
