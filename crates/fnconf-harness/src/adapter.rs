//! The seam between the harness and a live engine.

use std::fmt;

use fnconf_error::Result;
use fnconf_types::SqlValue;
use serde::{Deserialize, Serialize};

use crate::engine::EngineProfile;
use crate::statement::SqlStatements;

/// An error the engine raised while running a case.
///
/// This is a value, not a harness failure: the classifier decides whether
/// the case expected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// What one execution produced: the first column of the first row, or the
/// error the engine raised.
pub type ExecutionResult = std::result::Result<SqlValue, EngineError>;

/// Runs built statements against an engine.
///
/// Implementations must leave no trace of a case behind: every run happens
/// inside a transaction that is rolled back whether the case succeeded,
/// failed, or the engine raised. The outer `Result` is reserved for harness
/// failures (connection loss, rollback failure); engine errors belong in the
/// inner [`ExecutionResult`].
pub trait ExecutionAdapter {
    fn profile(&self) -> &dyn EngineProfile;

    fn run(&mut self, statements: &SqlStatements) -> Result<ExecutionResult>;
}
