//! Case-to-dialect resolution.
//!
//! Resolution runs three gates in order, stopping at the first that
//! rejects the case:
//! 1. presence: is the function part of this dialect's surface at all?
//! 2. kernels: does the case hit a signature the engine declares unsupported?
//! 3. options: does the case request an option value the engine cannot honor?
//!
//! Malformed kernel metadata is a configuration defect and surfaces as
//! [`ConformanceError`], never as a resolution.

use std::collections::BTreeMap;
use std::fmt;

use fnconf_error::{ConformanceError, Result};
use fnconf_types::{Case, Kernel, LiteralType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::file::{DialectFile, DialectFunction, DialectKernel};
use crate::shape::FunctionShape;

/// How to treat cases whose function the dialect does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Absent functions are outside the dialect's surface and silently
    /// excluded.
    #[default]
    Normal,
    /// Absent functions are hard skips that need operator attention.
    Diagnostic,
}

/// The resolved, dialect-specific translation of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlMapping {
    pub local_name: String,
    pub shape: FunctionShape,
    pub should_pass: bool,
    /// Present iff `should_pass` is false.
    pub reason: Option<String>,
}

impl SqlMapping {
    fn supported(function: &IndexedFunction) -> Self {
        Self {
            local_name: function.function.local_name.clone(),
            shape: function.shape,
            should_pass: true,
            reason: None,
        }
    }

    fn rejected(function: &IndexedFunction, reason: String) -> Self {
        Self {
            local_name: function.function.local_name.clone(),
            shape: function.shape,
            should_pass: false,
            reason: Some(reason),
        }
    }
}

/// Why a case was skipped before any mapping was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The dialect declares the function but marks it unsupported.
    FunctionUnsupported { dialect: String, function: String },
    /// Diagnostic mode: the dialect does not declare the function.
    FunctionNotInDialect { dialect: String, function: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FunctionUnsupported { dialect, function } => {
                write!(f, "{dialect} marks function {function} as unsupported")
            }
            Self::FunctionNotInDialect { dialect, function } => {
                write!(f, "{dialect} does not declare function {function}")
            }
        }
    }
}

/// Outcome of [`Dialect::mapping_for_case`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NotApplicable,
    Skip(SkipReason),
    Mapped(SqlMapping),
}

#[derive(Debug, Clone)]
struct IndexedFunction {
    function: DialectFunction,
    shape: FunctionShape,
}

/// One engine's function-support metadata, indexed by function name.
#[derive(Debug, Clone)]
pub struct Dialect {
    name: String,
    kind: String,
    mode: ResolutionMode,
    scalar: BTreeMap<String, IndexedFunction>,
    aggregate: BTreeMap<String, IndexedFunction>,
}

impl Dialect {
    /// Index a parsed dialect document.
    ///
    /// A function name declared twice within one list keeps the later
    /// declaration; each replacement is logged.
    pub fn new(file: DialectFile) -> Self {
        let scalar = index_functions(&file.name, "scalar", file.scalar_functions, false);
        let aggregate = index_functions(&file.name, "aggregate", file.aggregate_functions, true);
        Self {
            name: file.name,
            kind: file.kind,
            mode: ResolutionMode::Normal,
            scalar,
            aggregate,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub const fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Declared function names, scalar then aggregate.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.scalar.keys().chain(self.aggregate.keys()).map(String::as_str)
    }

    fn lookup(&self, function: &str) -> Option<&IndexedFunction> {
        self.scalar
            .get(function)
            .or_else(|| self.aggregate.get(function))
    }

    /// Decide whether and how `case` maps onto this dialect.
    pub fn mapping_for_case(&self, case: &Case) -> Result<Resolution> {
        let Some(entry) = self.lookup(&case.function) else {
            return Ok(match self.mode {
                ResolutionMode::Normal => Resolution::NotApplicable,
                ResolutionMode::Diagnostic => {
                    warn!(
                        dialect = %self.name,
                        function = %case.function,
                        "function missing from dialect"
                    );
                    Resolution::Skip(SkipReason::FunctionNotInDialect {
                        dialect: self.name.clone(),
                        function: case.function.clone(),
                    })
                }
            });
        };

        if entry.function.unsupported {
            debug!(dialect = %self.name, function = %case.function, "function unsupported");
            return Ok(Resolution::Skip(SkipReason::FunctionUnsupported {
                dialect: self.name.clone(),
                function: case.function.clone(),
            }));
        }

        if let Some(kernel) = self.unsupported_kernel_for_case(entry, case)? {
            let reason = format!(
                "{} does not support kernel {}({}) -> {}",
                self.name,
                entry.function.name,
                kernel.arg_types.join(", "),
                kernel.result_type
            );
            debug!(dialect = %self.name, function = %case.function, reason = %reason, "kernel rejected");
            return Ok(Resolution::Mapped(SqlMapping::rejected(entry, reason)));
        }

        if let Some(reason) = self.unmet_option(entry, case) {
            debug!(dialect = %self.name, function = %case.function, reason = %reason, "option rejected");
            return Ok(Resolution::Mapped(SqlMapping::rejected(entry, reason)));
        }

        Ok(Resolution::Mapped(SqlMapping::supported(entry)))
    }

    fn unsupported_kernel_for_case<'a>(
        &self,
        entry: &'a IndexedFunction,
        case: &Case,
    ) -> Result<Option<&'a DialectKernel>> {
        let aggregate = entry.shape.is_aggregate();
        let expected = if aggregate { 1 } else { case.args.len() };
        let actual: Vec<&str> = case.arg_types().map(LiteralType::as_str).collect();

        for kernel in &entry.function.unsupported_kernels {
            if kernel.arg_types.len() != expected {
                return Err(ConformanceError::KernelArity {
                    dialect: self.name.clone(),
                    function: entry.function.name.clone(),
                    declared: kernel.arg_types.len(),
                    expected,
                });
            }

            if !kernel_matches(aggregate, &kernel.arg_types, &actual) {
                continue;
            }

            if let Some(result_type) = case.result.declared_type() {
                if kernel.result_type != result_type.as_str() {
                    return Err(ConformanceError::KernelResultType {
                        dialect: self.name.clone(),
                        function: entry.function.name.clone(),
                        declared: kernel.result_type.clone(),
                        expected: result_type.as_str().to_owned(),
                    });
                }
            }
            return Ok(Some(kernel));
        }
        Ok(None)
    }

    fn unmet_option(&self, entry: &IndexedFunction, case: &Case) -> Option<String> {
        case.options.iter().find_map(|(key, requested)| {
            // No requirement for a key means every value is accepted.
            let required = entry.function.required_options.get(key)?;
            (required != requested).then(|| {
                format!(
                    "{} expects {key}={required} but {key}={requested} was requested",
                    self.name
                )
            })
        })
    }

    /// Whether the dialect claims support for an arbitrary signature.
    ///
    /// Uses the same positional matching as case resolution, minus the
    /// result-type cross-check. Undeclared functions are unsupported.
    pub fn supports_kernel(&self, function_name: &str, kernel: &Kernel) -> Result<bool> {
        let Some(entry) = self.lookup(function_name) else {
            return Ok(false);
        };
        let aggregate = entry.shape.is_aggregate();
        let expected = if aggregate { 1 } else { kernel.arg_types.len() };
        let actual: Vec<&str> = kernel.arg_types.iter().map(String::as_str).collect();

        for unsupported in &entry.function.unsupported_kernels {
            let declared = unsupported.arg_types.len();
            let variadic_ok = kernel.variadic.is_some_and(|min| declared >= min);
            if declared != expected && !variadic_ok {
                return Err(ConformanceError::KernelArity {
                    dialect: self.name.clone(),
                    function: entry.function.name.clone(),
                    declared,
                    expected,
                });
            }
            if kernel_matches(aggregate, &unsupported.arg_types, &actual) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Raw option requirements for a function, for diagnostic tooling.
    pub fn required_options(&self, function_name: &str) -> Option<&BTreeMap<String, String>> {
        self.lookup(function_name)
            .map(|entry| &entry.function.required_options)
    }
}

/// Positional signature match shared by case resolution and
/// [`Dialect::supports_kernel`].
///
/// Aggregates compare the aggregated column's type only, so an aggregate
/// over no arguments matches no kernel.
fn kernel_matches(aggregate: bool, declared: &[String], actual: &[&str]) -> bool {
    if aggregate {
        return match (declared.first(), actual.first()) {
            (Some(declared), Some(actual)) => declared == actual,
            _ => false,
        };
    }
    declared
        .iter()
        .zip(actual)
        .all(|(declared, actual)| declared == actual)
}

fn index_functions(
    dialect: &str,
    list: &str,
    functions: Vec<DialectFunction>,
    listed_as_aggregate: bool,
) -> BTreeMap<String, IndexedFunction> {
    let mut indexed = BTreeMap::new();
    for function in functions {
        let (shape, flags_set) = FunctionShape::from_flags(&function, listed_as_aggregate);
        if flags_set > 1 {
            warn!(
                dialect,
                function = %function.name,
                flags_set,
                chosen = %shape,
                "conflicting shape flags; using highest precedence"
            );
        }
        if indexed.contains_key(&function.name) {
            warn!(
                dialect,
                list,
                function = %function.name,
                "duplicate function declaration; later entry wins"
            );
        }
        indexed.insert(function.name.clone(), IndexedFunction { function, shape });
    }
    indexed
}
