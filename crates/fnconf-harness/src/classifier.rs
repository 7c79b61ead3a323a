//! Result classification.
//!
//! Compares what the engine produced against what the case expected and
//! reduces it to one of five verdicts.

use std::fmt;

use fnconf_types::{ExpectedResult, Literal, LiteralType, LiteralValue, SqlValue};
use serde::{Deserialize, Serialize};

use crate::adapter::ExecutionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseResultKind {
    Success,
    Mismatch,
    Error,
    UnexpectedPass,
    Unsupported,
}

impl CaseResultKind {
    pub const ALL: [Self; 5] = [
        Self::Success,
        Self::Mismatch,
        Self::Error,
        Self::UnexpectedPass,
        Self::Unsupported,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Mismatch => "mismatch",
            Self::Error => "error",
            Self::UnexpectedPass => "unexpected_pass",
            Self::Unsupported => "unsupported",
        }
    }

    /// Verdicts that make a conformance run fail. `Unsupported` is a gap in
    /// the engine's type vocabulary, not a wrong answer.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Mismatch | Self::Error | Self::UnexpectedPass)
    }
}

impl fmt::Display for CaseResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one executed (or unexecutable) case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlCaseResult {
    pub kind: CaseResultKind,
    /// Rendered engine value, engine error message, or unsupported type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SqlCaseResult {
    pub const fn success() -> Self {
        Self {
            kind: CaseResultKind::Success,
            detail: None,
        }
    }

    pub fn mismatch(actual: &SqlValue) -> Self {
        Self::with_detail(CaseResultKind::Mismatch, actual.to_string())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_detail(CaseResultKind::Error, message)
    }

    pub fn unexpected_pass(actual: &SqlValue) -> Self {
        Self::with_detail(CaseResultKind::UnexpectedPass, actual.to_string())
    }

    pub fn unsupported(ty: LiteralType) -> Self {
        Self::with_detail(CaseResultKind::Unsupported, ty.as_str())
    }

    fn with_detail(kind: CaseResultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    pub const fn is_failure(&self) -> bool {
        self.kind.is_failure()
    }
}

pub fn classify(expected: &ExpectedResult, actual: &ExecutionResult) -> SqlCaseResult {
    match (expected, actual) {
        (ExpectedResult::Undefined, Ok(_)) | (ExpectedResult::Error, Err(_)) => {
            SqlCaseResult::success()
        }
        (ExpectedResult::Error, Ok(value)) => SqlCaseResult::unexpected_pass(value),
        // NaN comparison is not implemented; such cases always report an error.
        (ExpectedResult::Nan, Ok(value)) => {
            SqlCaseResult::error(format!("nan expectations are not supported (got {value})"))
        }
        (ExpectedResult::Nan, Err(err)) => {
            SqlCaseResult::error(format!("nan expectations are not supported (engine error: {err})"))
        }
        (ExpectedResult::Value(literal), Ok(value)) => {
            if value_matches(literal, value) {
                SqlCaseResult::success()
            } else {
                SqlCaseResult::mismatch(value)
            }
        }
        (ExpectedResult::Undefined | ExpectedResult::Value(_), Err(err)) => {
            SqlCaseResult::error(err.to_string())
        }
    }
}

/// Does the engine value equal the expected literal?
pub fn value_matches(expected: &Literal, actual: &SqlValue) -> bool {
    let Some(want) = &expected.value else {
        return actual.is_null();
    };
    if let Some(temporal) = actual.as_temporal() {
        return temporal.text == want.to_string();
    }
    match (want, actual) {
        (LiteralValue::Integer(w), SqlValue::Integer(a)) => w == a,
        (LiteralValue::Integer(w), SqlValue::Float(a)) => integer_equals_float(*w, *a),
        (LiteralValue::Float(w), SqlValue::Float(a)) => w == a,
        (LiteralValue::Float(w), SqlValue::Integer(a)) => integer_equals_float(*a, *w),
        (LiteralValue::Boolean(w), SqlValue::Boolean(a)) => w == a,
        (LiteralValue::Boolean(w), SqlValue::Integer(a)) => i64::from(*w) == *a,
        (LiteralValue::Text(w), SqlValue::Text(a)) => w == a,
        _ => false,
    }
}

/// Exact mixed-type comparison: the float must be integral and denote the
/// same integer, with no rounding through `f64`.
fn integer_equals_float(int: i64, float: f64) -> bool {
    float.is_finite() && float.fract() == 0.0 && float as i128 == i128::from(int)
}
