use fnconf_error::{ConformanceError, Result};
use fnconf_types::{SqlValue, TemporalKind, TemporalValue};
use postgres::{Client, NoTls, Row, Transaction};
use tracing::{debug, trace};

use crate::adapter::{EngineError, ExecutionAdapter, ExecutionResult};
use crate::config::PostgresSettings;
use crate::engine::{EngineProfile, PostgresProfile};
use crate::statement::SqlStatements;

/// [`ExecutionAdapter`] backed by a synchronous `postgres` client.
pub struct PostgresAdapter {
    client: Client,
    profile: PostgresProfile,
}

impl PostgresAdapter {
    pub fn connect(settings: &PostgresSettings) -> Result<Self> {
        let mut config = postgres::Config::new();
        config
            .host(&settings.host)
            .dbname(&settings.dbname)
            .user(&settings.user)
            .password(&settings.password);
        let client = config.connect(NoTls).map_err(|e| {
            ConformanceError::connection(
                "postgres",
                format!("{}@{}/{}: {e}", settings.user, settings.host, settings.dbname),
            )
        })?;
        debug!(
            host = %settings.host,
            dbname = %settings.dbname,
            user = %settings.user,
            "opened postgres connection"
        );
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            profile: PostgresProfile,
        }
    }

    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl ExecutionAdapter for PostgresAdapter {
    fn profile(&self) -> &dyn EngineProfile {
        &self.profile
    }

    fn run(&mut self, statements: &SqlStatements) -> Result<ExecutionResult> {
        let mut tx = self
            .client
            .transaction()
            .map_err(|e| ConformanceError::connection("postgres", format!("begin: {e}")))?;

        let outcome = execute(&mut tx, statements);
        tx.rollback()
            .map_err(|e| ConformanceError::connection("postgres", format!("rollback: {e}")))?;

        match outcome {
            Ok(Some(value)) => Ok(Ok(value)),
            Ok(None) => Ok(Err(EngineError::new("query returned no rows"))),
            Err(err) if err.is_closed() => Err(ConformanceError::connection(
                "postgres",
                format!("connection closed: {err}"),
            )),
            Err(err) => {
                let err = engine_error(&err);
                debug!(query = %statements.query, error = %err, "postgres raised");
                Ok(Err(err))
            }
        }
    }
}

/// How the first result column is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnDecoding {
    /// Decoded through the driver's binary `FromSql` impls.
    Native,
    /// `numeric` has no lossless native mapping; read as text, then parsed.
    Numeric,
    /// Read as the server's text rendering.
    Text(Option<TemporalKind>),
}

impl ColumnDecoding {
    fn for_type_name(name: &str) -> Self {
        match name {
            "bool" | "int2" | "int4" | "int8" | "float4" | "float8" | "text" | "varchar"
            | "bpchar" | "name" | "bytea" => Self::Native,
            "numeric" => Self::Numeric,
            other => Self::Text(TemporalKind::from_decl_type(other)),
        }
    }
}

fn execute(
    tx: &mut Transaction<'_>,
    statements: &SqlStatements,
) -> std::result::Result<Option<SqlValue>, postgres::Error> {
    for sql in [&statements.ddl, &statements.dml].into_iter().flatten() {
        trace!(sql = %sql, "postgres batch_execute");
        tx.batch_execute(sql)?;
    }

    trace!(sql = %statements.query, "postgres prepare");
    let stmt = tx.prepare(&statements.query)?;
    let Some(column) = stmt.columns().first() else {
        return Ok(None);
    };
    let type_name = column.type_().name().to_owned();

    match ColumnDecoding::for_type_name(&type_name) {
        ColumnDecoding::Native => {
            let rows = tx.query(&stmt, &[])?;
            rows.first().map(|row| decode_native(row, &type_name)).transpose()
        }
        decoding => {
            let text_query = as_text_query(&statements.query);
            trace!(sql = %text_query, column_type = %type_name, "postgres text query");
            let rows = tx.query(text_query.as_str(), &[])?;
            let Some(row) = rows.first() else {
                return Ok(None);
            };
            let text: Option<String> = row.try_get(0)?;
            Ok(Some(text.map_or(SqlValue::Null, |text| decode_text(decoding, text))))
        }
    }
}

/// Wrap a single-column query so the server renders its value as text.
fn as_text_query(query: &str) -> String {
    let inner = query.trim_end().trim_end_matches(';');
    format!("SELECT q.v::text FROM ({inner}) AS q(v);")
}

fn decode_native(row: &Row, type_name: &str) -> std::result::Result<SqlValue, postgres::Error> {
    let value = match type_name {
        "bool" => row.try_get::<_, Option<bool>>(0)?.map(SqlValue::Boolean),
        "int2" => row
            .try_get::<_, Option<i16>>(0)?
            .map(|v| SqlValue::Integer(i64::from(v))),
        "int4" => row
            .try_get::<_, Option<i32>>(0)?
            .map(|v| SqlValue::Integer(i64::from(v))),
        "int8" => row.try_get::<_, Option<i64>>(0)?.map(SqlValue::Integer),
        "float4" => row
            .try_get::<_, Option<f32>>(0)?
            .map(|v| SqlValue::Float(f64::from(v))),
        "float8" => row.try_get::<_, Option<f64>>(0)?.map(SqlValue::Float),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(0)?.map(SqlValue::Blob),
        _ => row.try_get::<_, Option<String>>(0)?.map(SqlValue::Text),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

fn decode_text(decoding: ColumnDecoding, text: String) -> SqlValue {
    match decoding {
        ColumnDecoding::Numeric => {
            if let Ok(int) = text.parse::<i64>() {
                SqlValue::Integer(int)
            } else if let Ok(float) = text.parse::<f64>() {
                SqlValue::Float(float)
            } else {
                SqlValue::Text(text)
            }
        }
        ColumnDecoding::Text(Some(kind)) => SqlValue::Temporal(TemporalValue { kind, text }),
        ColumnDecoding::Text(None) | ColumnDecoding::Native => SqlValue::Text(text),
    }
}

fn engine_error(err: &postgres::Error) -> EngineError {
    let code = err.code().map(|state| state.code().to_owned());
    let message = err
        .as_db_error()
        .map_or_else(|| err.to_string(), |db| db.message().to_owned());
    EngineError { message, code }
}
