use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic type tag carried by every case literal.
///
/// This is the engine-independent vocabulary; each engine profile maps a
/// subset of it onto concrete column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralType {
    I8,
    I16,
    I32,
    I64,
    Fp32,
    Fp64,
    Boolean,
    String,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
}

impl LiteralType {
    pub const ALL: [Self; 13] = [
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::Fp32,
        Self::Fp64,
        Self::Boolean,
        Self::String,
        Self::Date,
        Self::Time,
        Self::Timestamp,
        Self::TimestampTz,
        Self::Interval,
    ];

    /// Canonical tag, as written in case catalogs and dialect kernels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Fp32 => "fp32",
            Self::Fp64 => "fp64",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestamp_tz",
            Self::Interval => "interval",
        }
    }

    /// Types whose non-null literals are written as quoted SQL strings.
    ///
    /// Intervals are deliberately absent: they render unquoted.
    pub const fn is_quoted(self) -> bool {
        matches!(
            self,
            Self::String | Self::Date | Self::Time | Self::Timestamp | Self::TimestampTz
        )
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLiteralType(pub String);

impl fmt::Display for UnknownLiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown literal type: {}", self.0)
    }
}

impl std::error::Error for UnknownLiteralType {}

impl FromStr for LiteralType {
    type Err = UnknownLiteralType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownLiteralType(s.to_owned()))
    }
}

/// A non-null literal payload.
///
/// Temporal values travel as text in their catalog form (`2020-01-01`,
/// `12:30:00`, ...); only the type tag distinguishes them from strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl LiteralValue {
    /// `Some(true)` for +inf, `Some(false)` for -inf, `None` otherwise.
    pub fn infinity_sign(&self) -> Option<bool> {
        match self {
            Self::Float(f) if f.is_infinite() => Some(f.is_sign_positive()),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Render a float so that integral values keep a trailing `.0`.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f == f.floor() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// A typed case literal. `value == None` is SQL NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    #[serde(rename = "type")]
    pub literal_type: LiteralType,
    #[serde(default)]
    pub value: Option<LiteralValue>,
}

impl Literal {
    pub fn new(literal_type: LiteralType, value: impl Into<LiteralValue>) -> Self {
        Self {
            literal_type,
            value: Some(value.into()),
        }
    }

    pub const fn null(literal_type: LiteralType) -> Self {
        Self {
            literal_type,
            value: None,
        }
    }

    pub const fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
