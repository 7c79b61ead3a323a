use std::collections::BTreeMap;

use fnconf_error::{ConformanceError, Result};
use tracing::{info, warn};

use crate::file::DialectFile;
use crate::resolver::{Dialect, ResolutionMode};

/// Registry of every configured dialect, keyed by dialect name.
///
/// Built once per process and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct DialectLibrary {
    dialects: BTreeMap<String, Dialect>,
}

impl DialectLibrary {
    pub fn new(files: impl IntoIterator<Item = DialectFile>) -> Self {
        Self::with_mode(files, ResolutionMode::Normal)
    }

    pub fn with_mode(files: impl IntoIterator<Item = DialectFile>, mode: ResolutionMode) -> Self {
        let mut dialects = BTreeMap::new();
        for file in files {
            let dialect = Dialect::new(file).with_mode(mode);
            let name = dialect.name().to_owned();
            if dialects.insert(name.clone(), dialect).is_some() {
                warn!(dialect = %name, "duplicate dialect name; later document wins");
            }
        }
        info!(dialect_count = dialects.len(), mode = ?mode, "dialect library built");
        Self { dialects }
    }

    pub fn dialect(&self, name: &str) -> Result<&Dialect> {
        self.dialects
            .get(name)
            .ok_or_else(|| ConformanceError::UnknownDialect {
                name: name.to_owned(),
            })
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}
