use std::fmt;
use std::path::PathBuf;

use fnconf_dialect::ResolutionMode;
use fnconf_error::{ConformanceError, Result};

use crate::engine::EngineKind;

pub const ENV_ENGINE: &str = "FNCONF_ENGINE";
pub const ENV_SQLITE_PATH: &str = "FNCONF_SQLITE_PATH";
pub const ENV_DIAGNOSTIC: &str = "FNCONF_DIAGNOSTIC";
pub const ENV_POSTGRES_HOST: &str = "POSTGRES_HOST";
pub const ENV_POSTGRES_DB: &str = "POSTGRES_DB";
pub const ENV_POSTGRES_USER: &str = "POSTGRES_USER";
pub const ENV_POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";

/// Path understood by SQLite as a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Runtime settings for a conformance run.
///
/// Environment values form the base layer; command-line flags are applied
/// on top by the gate binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub engine: EngineKind,
    pub sqlite_path: PathBuf,
    pub mode: ResolutionMode,
    pub postgres: PostgresSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            sqlite_path: PathBuf::from(IN_MEMORY),
            mode: ResolutionMode::Normal,
            postgres: PostgresSettings::default(),
        }
    }
}

/// Connection parameters for a live PostgreSQL server.
///
/// A `host` starting with `/` names a Unix socket directory.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresSettings {
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            dbname: "bft".to_owned(),
            user: "postgres".to_owned(),
            password: "postgres".to_owned(),
        }
    }
}

impl fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset and empty values fall back
    /// to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();
        if let Some(engine) = get(ENV_ENGINE) {
            config.engine = engine.parse()?;
        }
        if let Some(path) = get(ENV_SQLITE_PATH) {
            config.sqlite_path = PathBuf::from(path);
        }
        if let Some(flag) = get(ENV_DIAGNOSTIC) {
            if parse_flag(ENV_DIAGNOSTIC, &flag)? {
                config.mode = ResolutionMode::Diagnostic;
            }
        }

        let settings = &mut config.postgres;
        for (key, slot) in [
            (ENV_POSTGRES_HOST, &mut settings.host),
            (ENV_POSTGRES_DB, &mut settings.dbname),
            (ENV_POSTGRES_USER, &mut settings.user),
            (ENV_POSTGRES_PASSWORD, &mut settings.password),
        ] {
            if let Some(value) = get(key) {
                *slot = value;
            }
        }
        Ok(config)
    }

    pub fn is_in_memory(&self) -> bool {
        self.sqlite_path.as_os_str() == IN_MEMORY
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConformanceError::config(format!(
            "{key} must be a boolean flag, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = HarnessConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert!(config.is_in_memory());
        assert_eq!(config.engine, EngineKind::Sqlite);
        assert_eq!(config.mode, ResolutionMode::Normal);
    }

    #[test]
    fn values_override_defaults() {
        let config = HarnessConfig::from_lookup(lookup(&[
            (ENV_ENGINE, "postgres"),
            (ENV_SQLITE_PATH, "/tmp/cases.db"),
            (ENV_DIAGNOSTIC, "1"),
        ]))
        .unwrap();
        assert_eq!(config.engine, EngineKind::Postgres);
        assert_eq!(config.sqlite_path, PathBuf::from("/tmp/cases.db"));
        assert_eq!(config.mode, ResolutionMode::Diagnostic);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn postgres_settings_default_to_local_server() {
        let config = HarnessConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.postgres.host, "localhost");
        assert_eq!(config.postgres.dbname, "bft");
        assert_eq!(config.postgres.user, "postgres");
        assert_eq!(config.postgres.password, "postgres");
    }

    #[test]
    fn postgres_settings_read_from_lookup() {
        let config = HarnessConfig::from_lookup(lookup(&[
            (ENV_POSTGRES_HOST, "db.internal"),
            (ENV_POSTGRES_DB, "conformance"),
            (ENV_POSTGRES_USER, "runner"),
            (ENV_POSTGRES_PASSWORD, "s3cret"),
        ]))
        .unwrap();
        assert_eq!(
            config.postgres,
            PostgresSettings {
                host: "db.internal".to_owned(),
                dbname: "conformance".to_owned(),
                user: "runner".to_owned(),
                password: "s3cret".to_owned(),
            }
        );
        // Unrelated settings keep their defaults.
        assert_eq!(config.engine, EngineKind::Sqlite);

        let partial =
            HarnessConfig::from_lookup(lookup(&[(ENV_POSTGRES_USER, "runner"), (ENV_POSTGRES_DB, "")]))
                .unwrap();
        assert_eq!(partial.postgres.user, "runner");
        assert_eq!(partial.postgres.dbname, "bft");
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let mut config = HarnessConfig::default();
        config.postgres.password = "s3cret".to_owned();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"), "{rendered}");
        assert!(rendered.contains("<redacted>"), "{rendered}");
    }

    #[test]
    fn empty_values_are_unset() {
        let config =
            HarnessConfig::from_lookup(lookup(&[(ENV_ENGINE, " "), (ENV_DIAGNOSTIC, "")])).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = HarnessConfig::from_lookup(lookup(&[(ENV_DIAGNOSTIC, "maybe")])).unwrap_err();
        assert!(matches!(err, ConformanceError::Config { .. }), "{err}");
        let err = HarnessConfig::from_lookup(lookup(&[(ENV_ENGINE, "oracle")])).unwrap_err();
        assert!(matches!(err, ConformanceError::Config { .. }), "{err}");
    }
}
