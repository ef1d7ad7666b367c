use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// PostgreSQL column types.
///
/// Serialized as its SQL spelling (`"varchar(255)"`, `"text[]"`), so model
/// files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SqlType {
    /// UUID type
    Uuid,
    /// Variable-length string with optional max length
    Varchar(Option<u32>),
    /// Unlimited text
    Text,
    /// 16-bit integer
    SmallInt,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInt,
    /// Auto-incrementing 32-bit integer
    Serial,
    /// Auto-incrementing 64-bit integer
    BigSerial,
    /// 32-bit floating point
    Real,
    /// 64-bit floating point
    DoublePrecision,
    /// Boolean
    Boolean,
    /// Timestamp with timezone
    Timestamptz,
    /// Timestamp without timezone
    Timestamp,
    /// Date without time
    Date,
    /// Decimal with precision and scale
    Decimal(u8, u8),
    /// JSONB for structured data
    Jsonb,
    /// Byte array
    Bytea,
    /// Array of another type
    Array(Box<SqlType>),
    /// Anything else, emitted verbatim (enum types, domains)
    Custom(String),
}

impl SqlType {
    /// Generate the SQL type declaration.
    pub fn to_sql(&self) -> String {
        match self {
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Varchar(None) => "VARCHAR".to_string(),
            SqlType::Varchar(Some(len)) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Serial => "SERIAL".to_string(),
            SqlType::BigSerial => "BIGSERIAL".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::DoublePrecision => "DOUBLE PRECISION".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamptz => "TIMESTAMPTZ".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Decimal(p, s) => format!("DECIMAL({}, {})", p, s),
            SqlType::Jsonb => "JSONB".to_string(),
            SqlType::Bytea => "BYTEA".to_string(),
            SqlType::Array(inner) => format!("{}[]", inner.to_sql()),
            SqlType::Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl FromStr for SqlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("column type must not be empty".to_string());
        }

        if let Some(inner) = trimmed.strip_suffix("[]") {
            return Ok(SqlType::Array(Box::new(inner.parse()?)));
        }

        let lower = trimmed.to_ascii_lowercase();
        let (base, args) = match lower.find('(') {
            Some(open) if lower.ends_with(')') => {
                (lower[..open].trim(), Some(&lower[open + 1..lower.len() - 1]))
            }
            Some(_) => return Err(format!("unbalanced parentheses in type '{}'", trimmed)),
            None => (lower.as_str(), None),
        };

        let ty = match (base, args) {
            ("uuid", None) => SqlType::Uuid,
            ("varchar" | "character varying", None) => SqlType::Varchar(None),
            ("varchar" | "character varying", Some(len)) => {
                let len = len
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid varchar length in '{}'", trimmed))?;
                SqlType::Varchar(Some(len))
            }
            ("text", None) => SqlType::Text,
            ("smallint" | "int2", None) => SqlType::SmallInt,
            ("integer" | "int" | "int4", None) => SqlType::Integer,
            ("bigint" | "int8", None) => SqlType::BigInt,
            ("serial", None) => SqlType::Serial,
            ("bigserial", None) => SqlType::BigSerial,
            ("real" | "float4", None) => SqlType::Real,
            ("double precision" | "float8", None) => SqlType::DoublePrecision,
            ("boolean" | "bool", None) => SqlType::Boolean,
            ("timestamptz" | "timestamp with time zone", None) => SqlType::Timestamptz,
            ("timestamp" | "timestamp without time zone", None) => SqlType::Timestamp,
            ("date", None) => SqlType::Date,
            ("decimal" | "numeric", Some(args)) => {
                let mut parts = args.split(',').map(|p| p.trim().parse::<u8>());
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(Ok(p)), Some(Ok(s)), None) => SqlType::Decimal(p, s),
                    _ => return Err(format!("invalid decimal arguments in '{}'", trimmed)),
                }
            }
            ("jsonb", None) => SqlType::Jsonb,
            ("bytea", None) => SqlType::Bytea,
            _ => SqlType::Custom(trimmed.to_string()),
        };

        Ok(ty)
    }
}

impl TryFrom<String> for SqlType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SqlType> for String {
    fn from(value: SqlType) -> Self {
        value.to_sql()
    }
}
