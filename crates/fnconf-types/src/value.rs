use std::fmt;

use serde::{Deserialize, Serialize};

use crate::literal::format_float;

/// Which temporal family an engine value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
}

impl TemporalKind {
    /// Classify a declared engine column type (`DATE`, `timestamptz`, ...).
    pub fn from_decl_type(decl: &str) -> Option<Self> {
        let decl = decl.trim().to_ascii_lowercase();
        match decl.as_str() {
            "date" => Some(Self::Date),
            "time" | "time without time zone" => Some(Self::Time),
            "timestamp" | "datetime" | "timestamp without time zone" => Some(Self::Timestamp),
            "timestamptz" | "timestamp with time zone" => Some(Self::TimestampTz),
            "interval" => Some(Self::Interval),
            _ => None,
        }
    }
}

/// A temporal value as the engine rendered it.
///
/// Engines disagree on precision and zone formatting, so the text is kept
/// verbatim and compared textually against case literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalValue {
    pub kind: TemporalKind,
    pub text: String,
}

/// The first column of the first row returned by an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Temporal(TemporalValue),
}

impl SqlValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_temporal(&self) -> Option<&TemporalValue> {
        match self {
            Self::Temporal(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Text(s) => f.write_str(s),
            Self::Blob(b) => {
                f.write_str("x'")?;
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
            Self::Temporal(t) => f.write_str(&t.text),
        }
    }
}
