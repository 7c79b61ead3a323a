use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for the conformance harness.
///
/// Only failures that stop a run live here. Per-case outcomes (skips,
/// mismatches, engine errors raised by the SQL under test) are values, not
/// errors, and never travel through this type.
#[derive(Error, Debug)]
pub enum ConformanceError {
    // === Configuration defects ===
    /// An unsupported-kernel signature declares a different number of
    /// argument types than the case (or kernel) it is compared against.
    #[error(
        "dialect {dialect}: unsupported kernel for {function} declares {declared} argument types but {expected} were expected"
    )]
    KernelArity {
        dialect: String,
        function: String,
        declared: usize,
        expected: usize,
    },

    /// An unsupported-kernel signature matches a case's argument types but
    /// declares a different result type than the case expects.
    #[error(
        "dialect {dialect}: unsupported kernel for {function} matches the argument types but declares result {declared}, case expects {expected}"
    )]
    KernelResultType {
        dialect: String,
        function: String,
        declared: String,
        expected: String,
    },

    /// A function shape cannot be rendered with the case's argument count.
    #[error("{shape} function {function} called with {actual} arguments (expected {expected})")]
    ShapeArity {
        function: String,
        shape: &'static str,
        expected: &'static str,
        actual: usize,
    },

    // === Lookup / loading errors ===
    /// No dialect with the requested name is registered.
    #[error("no such dialect: {name}")]
    UnknownDialect { name: String },

    /// Harness configuration (environment or CLI) is invalid.
    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    /// A dialect or case document could not be decoded.
    #[error("failed to load {}: {detail}", path.display())]
    Catalog { path: PathBuf, detail: String },

    // === Engine plumbing ===
    /// Opening, beginning or rolling back on the engine connection failed.
    ///
    /// Errors raised by the statements under test are not reported here.
    #[error("{engine} connection failure: {detail}")]
    Connection { engine: String, detail: String },

    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConformanceError {
    /// Whether the error indicates malformed dialect metadata rather than an
    /// environmental failure.
    pub const fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Self::KernelArity { .. } | Self::KernelResultType { .. } | Self::ShapeArity { .. }
        )
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn connection(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Connection {
            engine: engine.into(),
            detail: detail.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `ConformanceError`.
pub type Result<T> = std::result::Result<T, ConformanceError>;
