use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::literal::{Literal, LiteralType};

/// Expected outcome of a case.
///
/// Only [`ExpectedResult::Value`] carries a declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExpectedRepr", into = "ExpectedRepr")]
pub enum ExpectedResult {
    /// The function must return exactly this literal.
    Value(Literal),
    /// The function must raise an engine error.
    Error,
    /// Any non-error return is acceptable.
    Undefined,
    /// The function must return NaN.
    Nan,
}

impl ExpectedResult {
    pub const fn declared_type(&self) -> Option<LiteralType> {
        match self {
            Self::Value(lit) => Some(lit.literal_type),
            Self::Error | Self::Undefined | Self::Nan => None,
        }
    }
}

impl fmt::Display for ExpectedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(lit) => f.write_str(lit.literal_type.as_str()),
            Self::Error => f.write_str("error"),
            Self::Undefined => f.write_str("undefined"),
            Self::Nan => f.write_str("nan"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ExpectedKeyword {
    Error,
    Undefined,
    Nan,
}

/// Wire form: either a bare keyword string or a `{type, value}` literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ExpectedRepr {
    Keyword(ExpectedKeyword),
    Literal(Literal),
}

impl From<ExpectedRepr> for ExpectedResult {
    fn from(repr: ExpectedRepr) -> Self {
        match repr {
            ExpectedRepr::Keyword(ExpectedKeyword::Error) => Self::Error,
            ExpectedRepr::Keyword(ExpectedKeyword::Undefined) => Self::Undefined,
            ExpectedRepr::Keyword(ExpectedKeyword::Nan) => Self::Nan,
            ExpectedRepr::Literal(lit) => Self::Value(lit),
        }
    }
}

impl From<ExpectedResult> for ExpectedRepr {
    fn from(result: ExpectedResult) -> Self {
        match result {
            ExpectedResult::Value(lit) => Self::Literal(lit),
            ExpectedResult::Error => Self::Keyword(ExpectedKeyword::Error),
            ExpectedResult::Undefined => Self::Keyword(ExpectedKeyword::Undefined),
            ExpectedResult::Nan => Self::Keyword(ExpectedKeyword::Nan),
        }
    }
}

/// One abstract test vector, independent of any engine's syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub function: String,
    #[serde(default)]
    pub args: Vec<Literal>,
    /// Requested option values, in catalog order. Keys are not deduplicated.
    #[serde(default)]
    pub options: Vec<(String, String)>,
    pub result: ExpectedResult,
}

impl Case {
    pub fn new(function: impl Into<String>, args: Vec<Literal>, result: ExpectedResult) -> Self {
        Self {
            function: function.into(),
            args,
            options: Vec::new(),
            result,
        }
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    pub fn arg_types(&self) -> impl Iterator<Item = LiteralType> + '_ {
        self.args.iter().map(|arg| arg.literal_type)
    }

    /// `name(t0, t1, ...) -> result` rendering used in reports.
    pub fn kernel_signature(&self) -> String {
        let types: Vec<&str> = self.arg_types().map(LiteralType::as_str).collect();
        format!("{}({}) -> {}", self.function, types.join(", "), self.result)
    }

    /// Stable 64-bit fingerprint of the case contents.
    ///
    /// Two cases that differ in function, any argument, any option or the
    /// expected result get different fingerprints (modulo xxh3 collisions).
    pub fn fingerprint(&self) -> u64 {
        let mut buf = Vec::with_capacity(64);
        push_field(&mut buf, self.function.as_bytes());
        for arg in &self.args {
            push_literal(&mut buf, arg);
        }
        buf.push(0x1E);
        for (key, value) in &self.options {
            push_field(&mut buf, key.as_bytes());
            push_field(&mut buf, value.as_bytes());
        }
        buf.push(0x1E);
        match &self.result {
            ExpectedResult::Value(lit) => push_literal(&mut buf, lit),
            other => push_field(&mut buf, other.to_string().as_bytes()),
        }
        xxh3_64(&buf)
    }
}

fn push_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn push_literal(buf: &mut Vec<u8>, lit: &Literal) {
    push_field(buf, lit.literal_type.as_str().as_bytes());
    match &lit.value {
        Some(value) => push_field(buf, value.to_string().as_bytes()),
        None => buf.push(0xFF),
    }
}

/// An official function signature, as enumerated by external tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kernel {
    pub arg_types: Vec<String>,
    pub result_type: String,
    /// Minimum argument count when the kernel is variadic.
    #[serde(default)]
    pub variadic: Option<usize>,
}

impl Kernel {
    pub fn new(arg_types: &[&str], result_type: &str) -> Self {
        Self {
            arg_types: arg_types.iter().map(|ty| (*ty).to_owned()).collect(),
            result_type: result_type.to_owned(),
            variadic: None,
        }
    }

    #[must_use]
    pub fn variadic(mut self, min_args: usize) -> Self {
        self.variadic = Some(min_args);
        self
    }
}
