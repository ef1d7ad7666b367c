use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// Identifies one migration stream inside a shared history table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContextKey(String);

impl ContextKey {
    /// Create a key from an explicit identifier. Blank keys are rejected.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(StrataError::InvalidArgument(
                "context key must not be blank".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derive the key from a consumer type: its unqualified name without generics.
    ///
    /// `my_app::db::BlogContext<Pg>` becomes `BlogContext`.
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let short = base.rsplit("::").next().unwrap_or(base);
        Self(short.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContextKey {
    type Error = StrataError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ContextKey> for String {
    fn from(value: ContextKey) -> Self {
        value.0
    }
}
