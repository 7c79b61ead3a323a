use std::path::Path;

use fnconf_error::{ConformanceError, Result};
use fnconf_types::{SqlValue, TemporalKind, TemporalValue};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, DropBehavior, Transaction};
use tracing::{debug, trace};

use crate::adapter::{EngineError, ExecutionAdapter, ExecutionResult};
use crate::engine::{EngineProfile, SqliteProfile};
use crate::statement::SqlStatements;

/// [`ExecutionAdapter`] backed by a `rusqlite` connection.
pub struct SqliteAdapter {
    conn: Connection,
    profile: SqliteProfile,
}

impl SqliteAdapter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| ConformanceError::connection("sqlite", format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "opened sqlite connection");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ConformanceError::connection("sqlite", e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            profile: SqliteProfile,
        }
    }

    /// Borrow the underlying connection, e.g. to inspect state between runs.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ExecutionAdapter for SqliteAdapter {
    fn profile(&self) -> &dyn EngineProfile {
        &self.profile
    }

    fn run(&mut self, statements: &SqlStatements) -> Result<ExecutionResult> {
        let mut tx = self
            .conn
            .transaction()
            .map_err(|e| ConformanceError::connection("sqlite", format!("begin: {e}")))?;
        tx.set_drop_behavior(DropBehavior::Rollback);

        let outcome = execute(&tx, statements);
        tx.rollback()
            .map_err(|e| ConformanceError::connection("sqlite", format!("rollback: {e}")))?;

        if let Err(err) = &outcome {
            debug!(query = %statements.query, error = %err, "sqlite raised");
        }
        Ok(outcome)
    }
}

fn execute(tx: &Transaction<'_>, statements: &SqlStatements) -> ExecutionResult {
    for sql in [&statements.ddl, &statements.dml].into_iter().flatten() {
        trace!(sql = %sql, "sqlite execute_batch");
        tx.execute_batch(sql).map_err(engine_error)?;
    }

    trace!(sql = %statements.query, "sqlite query");
    let mut stmt = tx.prepare(&statements.query).map_err(engine_error)?;
    let decl_type = stmt
        .columns()
        .first()
        .and_then(|column| column.decl_type().map(str::to_owned));
    let mut rows = stmt.query([]).map_err(engine_error)?;
    let Some(row) = rows.next().map_err(engine_error)? else {
        return Err(EngineError::new("query returned no rows"));
    };
    let value = row.get_ref(0).map_err(engine_error)?;
    Ok(to_sql_value(value, decl_type.as_deref()))
}

fn to_sql_value(value: ValueRef<'_>, decl_type: Option<&str>) -> SqlValue {
    let temporal = decl_type.and_then(TemporalKind::from_decl_type);
    let is_boolean = decl_type.is_some_and(|decl| decl.eq_ignore_ascii_case("boolean"));
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) if is_boolean && (i == 0 || i == 1) => SqlValue::Boolean(i == 1),
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match temporal {
                Some(kind) => SqlValue::Temporal(TemporalValue { kind, text }),
                None => SqlValue::Text(text),
            }
        }
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}

fn engine_error(err: rusqlite::Error) -> EngineError {
    let code = err.sqlite_error_code().map(|code| format!("{code:?}"));
    let message = match &err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
        other => other.to_string(),
    };
    EngineError { message, code }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(ddl: Option<&str>, dml: Option<&str>, query: &str) -> SqlStatements {
        SqlStatements {
            ddl: ddl.map(str::to_owned),
            dml: dml.map(str::to_owned),
            query: query.to_owned(),
        }
    }

    #[test]
    fn first_column_of_first_row() {
        let mut adapter = SqliteAdapter::open_in_memory().unwrap();
        let result = adapter
            .run(&statements(
                Some("CREATE TABLE t (arg0 INTEGER, arg1 INTEGER);"),
                Some("INSERT INTO t (arg0, arg1) VALUES (1, 2);"),
                "SELECT arg0 + arg1, 'ignored' FROM t;",
            ))
            .unwrap();
        assert_eq!(result, Ok(SqlValue::Integer(3)));
    }

    #[test]
    fn engine_errors_are_values() {
        let mut adapter = SqliteAdapter::open_in_memory().unwrap();
        let result = adapter
            .run(&statements(None, None, "SELECT no_such_function(1);"))
            .unwrap();
        let err = result.unwrap_err();
        assert!(err.message.contains("no_such_function"), "{err}");
    }

    #[test]
    fn every_run_is_rolled_back() {
        let mut adapter = SqliteAdapter::open_in_memory().unwrap();
        let build = statements(
            Some("CREATE TABLE t (arg0 TEXT);"),
            Some("INSERT INTO t (arg0) VALUES ('x');"),
            "SELECT arg0 FROM t;",
        );
        assert_eq!(
            adapter.run(&build).unwrap(),
            Ok(SqlValue::Text("x".to_owned()))
        );
        // The table from the first run must be gone, so CREATE succeeds again.
        assert_eq!(
            adapter.run(&build).unwrap(),
            Ok(SqlValue::Text("x".to_owned()))
        );
        let tables: i64 = adapter
            .connection()
            .query_row("SELECT count(*) FROM sqlite_master;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn failing_case_is_also_rolled_back() {
        let mut adapter = SqliteAdapter::open_in_memory().unwrap();
        let failing = statements(
            Some("CREATE TABLE t (arg0 INTEGER);"),
            Some("INSERT INTO t (arg0) VALUES (1);"),
            "SELECT missing_column FROM t;",
        );
        assert!(adapter.run(&failing).unwrap().is_err());
        let tables: i64 = adapter
            .connection()
            .query_row("SELECT count(*) FROM sqlite_master;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn declared_types_shape_values() {
        let mut adapter = SqliteAdapter::open_in_memory().unwrap();
        let date = adapter
            .run(&statements(
                Some("CREATE TABLE t (arg0 DATE);"),
                Some("INSERT INTO t (arg0) VALUES ('2020-01-01');"),
                "SELECT arg0 FROM t;",
            ))
            .unwrap();
        assert_eq!(
            date,
            Ok(SqlValue::Temporal(TemporalValue {
                kind: TemporalKind::Date,
                text: "2020-01-01".to_owned(),
            }))
        );

        let flag = adapter
            .run(&statements(
                Some("CREATE TABLE t (arg0 BOOLEAN);"),
                Some("INSERT INTO t (arg0) VALUES (true);"),
                "SELECT arg0 FROM t;",
            ))
            .unwrap();
        assert_eq!(flag, Ok(SqlValue::Boolean(true)));
    }

    #[test]
    fn empty_result_is_an_engine_error() {
        let mut adapter = SqliteAdapter::open_in_memory().unwrap();
        let result = adapter
            .run(&statements(
                Some("CREATE TABLE t (arg0 INTEGER);"),
                None,
                "SELECT arg0 FROM t;",
            ))
            .unwrap();
        assert_eq!(result, Err(EngineError::new("query returned no rows")));
    }

    #[test]
    fn file_backed_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = SqliteAdapter::open(dir.path().join("cases.db")).unwrap();
        assert_eq!(
            adapter.run(&statements(None, None, "SELECT 1.5;")).unwrap(),
            Ok(SqlValue::Float(1.5))
        );
    }
}
