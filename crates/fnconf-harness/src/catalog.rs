//! Loading dialect documents and case catalogs from disk.
//!
//! Dialect documents and case catalogs are accepted as JSON or TOML; case
//! catalogs may also be JSON Lines. The format follows the file extension.

use std::path::Path;

use fnconf_dialect::DialectFile;
use fnconf_error::{ConformanceError, Result};
use fnconf_types::Case;
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    JsonLines,
    Toml,
}

impl CatalogFormat {
    /// `.toml` and `.jsonl`/`.ndjson` by extension; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => Self::Toml,
            Some("jsonl" | "ndjson") => Self::JsonLines,
            _ => Self::Json,
        }
    }
}

#[derive(Deserialize)]
struct TomlCases {
    #[serde(default)]
    cases: Vec<Case>,
}

pub fn load_dialect_file(path: &Path) -> Result<DialectFile> {
    let text = read(path)?;
    match CatalogFormat::from_path(path) {
        CatalogFormat::Toml => decode_toml(path, &text),
        CatalogFormat::Json | CatalogFormat::JsonLines => decode_json(path, &text),
    }
}

pub fn load_cases(path: &Path) -> Result<Vec<Case>> {
    let text = read(path)?;
    parse_cases(path, &text, CatalogFormat::from_path(path))
}

/// Decode a case catalog already held in memory. `origin` only labels errors.
pub fn parse_cases(origin: &Path, text: &str, format: CatalogFormat) -> Result<Vec<Case>> {
    match format {
        CatalogFormat::Json => decode_json(origin, text),
        CatalogFormat::Toml => decode_toml::<TomlCases>(origin, text).map(|doc| doc.cases),
        CatalogFormat::JsonLines => {
            let mut cases = Vec::new();
            for (line_index, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let case = serde_json::from_str(line).map_err(|error| {
                    catalog_error(origin, format!("line {}: {error}", line_index + 1))
                })?;
                cases.push(case);
            }
            Ok(cases)
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|error| catalog_error(path, error.to_string()))
}

fn decode_json<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|error| catalog_error(path, error.to_string()))
}

fn decode_toml<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T> {
    toml::from_str(text).map_err(|error| catalog_error(path, error.to_string()))
}

fn catalog_error(path: &Path, detail: String) -> ConformanceError {
    ConformanceError::Catalog {
        path: path.to_path_buf(),
        detail,
    }
}
