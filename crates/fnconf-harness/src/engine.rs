//! Engine profiles: the per-engine vocabulary the statement builder needs.
//!
//! A profile answers three questions: which concrete column type stands in
//! for a semantic type, how NULL is spelled, and how infinities are spelled.

use std::fmt;
use std::str::FromStr;

use fnconf_error::ConformanceError;
use fnconf_types::{Literal, LiteralType};
use serde::{Deserialize, Serialize};

pub trait EngineProfile {
    fn engine_name(&self) -> &'static str;

    /// Concrete column type for `ty`, or `None` if the engine has no
    /// faithful equivalent.
    fn column_type(&self, ty: LiteralType) -> Option<&'static str>;

    fn null_literal(&self) -> &'static str {
        "null"
    }

    fn infinity_literal(&self, positive: bool) -> &'static str;

    /// Render a case literal as SQL source text.
    fn render_literal(&self, literal: &Literal) -> String {
        let Some(value) = &literal.value else {
            return self.null_literal().to_owned();
        };
        if let Some(positive) = value.infinity_sign() {
            return self.infinity_literal(positive).to_owned();
        }
        let text = value.to_string();
        if literal.literal_type.is_quoted() {
            format!("'{}'", text.replace('\'', "''"))
        } else {
            text
        }
    }
}

/// SQLite, as exercised through `rusqlite`.
///
/// Declared types are chosen so that SQLite's affinity rules land on the
/// intended storage class and temporal columns keep a recognisable
/// declared type. SQLite has no zoned timestamps or intervals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteProfile;

impl EngineProfile for SqliteProfile {
    fn engine_name(&self) -> &'static str {
        "sqlite"
    }

    fn column_type(&self, ty: LiteralType) -> Option<&'static str> {
        match ty {
            LiteralType::I8 => Some("TINYINT"),
            LiteralType::I16 => Some("SMALLINT"),
            LiteralType::I32 => Some("INTEGER"),
            LiteralType::I64 => Some("BIGINT"),
            LiteralType::Fp32 => Some("FLOAT"),
            LiteralType::Fp64 => Some("DOUBLE"),
            LiteralType::Boolean => Some("BOOLEAN"),
            LiteralType::String => Some("TEXT"),
            LiteralType::Date => Some("DATE"),
            LiteralType::Time => Some("TIME"),
            LiteralType::Timestamp => Some("TIMESTAMP"),
            LiteralType::TimestampTz | LiteralType::Interval => None,
        }
    }

    fn infinity_literal(&self, positive: bool) -> &'static str {
        if positive { "9e999" } else { "-9e999" }
    }
}

/// PostgreSQL type vocabulary. There is no `i8` column type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresProfile;

impl EngineProfile for PostgresProfile {
    fn engine_name(&self) -> &'static str {
        "postgres"
    }

    fn column_type(&self, ty: LiteralType) -> Option<&'static str> {
        match ty {
            LiteralType::I8 => None,
            LiteralType::I16 => Some("smallint"),
            LiteralType::I32 => Some("integer"),
            LiteralType::I64 => Some("bigint"),
            LiteralType::Fp32 => Some("float4"),
            LiteralType::Fp64 => Some("float8"),
            LiteralType::Boolean => Some("boolean"),
            LiteralType::String => Some("text"),
            LiteralType::Date => Some("date"),
            LiteralType::Time => Some("time"),
            LiteralType::Timestamp => Some("timestamp"),
            LiteralType::TimestampTz => Some("timestamptz"),
            LiteralType::Interval => Some("interval"),
        }
    }

    fn infinity_literal(&self, positive: bool) -> &'static str {
        if positive { "'Infinity'" } else { "'-Infinity'" }
    }
}

/// Engines the harness knows how to generate SQL for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    Sqlite,
    Postgres,
}

impl EngineKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    pub fn profile(self) -> &'static dyn EngineProfile {
        match self {
            Self::Sqlite => &SqliteProfile,
            Self::Postgres => &PostgresProfile,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = ConformanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(ConformanceError::config(format!("unknown engine: {other}"))),
        }
    }
}
