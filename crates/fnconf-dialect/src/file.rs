//! Parsed dialect configuration records.
//!
//! These mirror the on-disk dialect documents field for field. Flags and
//! maps default to false/empty so sparse documents decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A signature the engine is known NOT to support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectKernel {
    pub arg_types: Vec<String>,
    pub result_type: String,
}

impl DialectKernel {
    pub fn new(arg_types: &[&str], result_type: &str) -> Self {
        Self {
            arg_types: arg_types.iter().map(|ty| (*ty).to_owned()).collect(),
            result_type: result_type.to_owned(),
        }
    }
}

/// One function entry of a dialect document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectFunction {
    pub name: String,
    pub local_name: String,
    #[serde(default)]
    pub infix: bool,
    #[serde(default)]
    pub postfix: bool,
    #[serde(default)]
    pub between: bool,
    #[serde(default)]
    pub aggregate: bool,
    #[serde(default)]
    pub extract: bool,
    #[serde(default)]
    pub unsupported: bool,
    #[serde(default)]
    pub required_options: BTreeMap<String, String>,
    #[serde(default)]
    pub unsupported_kernels: Vec<DialectKernel>,
}

impl DialectFunction {
    /// A plain call-syntax function with no restrictions.
    pub fn new(name: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_name: local_name.into(),
            infix: false,
            postfix: false,
            between: false,
            aggregate: false,
            extract: false,
            unsupported: false,
            required_options: BTreeMap::new(),
            unsupported_kernels: Vec::new(),
        }
    }

    #[must_use]
    pub fn infix(mut self) -> Self {
        self.infix = true;
        self
    }

    #[must_use]
    pub fn postfix(mut self) -> Self {
        self.postfix = true;
        self
    }

    #[must_use]
    pub fn between(mut self) -> Self {
        self.between = true;
        self
    }

    #[must_use]
    pub fn aggregate(mut self) -> Self {
        self.aggregate = true;
        self
    }

    #[must_use]
    pub fn extract(mut self) -> Self {
        self.extract = true;
        self
    }

    #[must_use]
    pub fn unsupported(mut self) -> Self {
        self.unsupported = true;
        self
    }

    #[must_use]
    pub fn require_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.required_options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn unsupported_kernel(mut self, arg_types: &[&str], result_type: &str) -> Self {
        self.unsupported_kernels
            .push(DialectKernel::new(arg_types, result_type));
        self
    }
}

/// A whole dialect document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectFile {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub scalar_functions: Vec<DialectFunction>,
    #[serde(default)]
    pub aggregate_functions: Vec<DialectFunction>,
}

impl DialectFile {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            scalar_functions: Vec::new(),
            aggregate_functions: Vec::new(),
        }
    }

    #[must_use]
    pub fn scalar(mut self, function: DialectFunction) -> Self {
        self.scalar_functions.push(function);
        self
    }

    #[must_use]
    pub fn aggregate(mut self, function: DialectFunction) -> Self {
        self.aggregate_functions.push(function);
        self
    }
}
