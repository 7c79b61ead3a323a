//! Function conformance harness.
//!
//! Resolves abstract cases against a [`fnconf_dialect::Dialect`], renders
//! them as SQL for an engine profile, executes them through an
//! [`ExecutionAdapter`] and classifies what came back.

pub mod adapter;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod logging;
pub mod postgres_adapter;
pub mod report;
pub mod runner;
pub mod sqlite_adapter;
pub mod statement;

pub use adapter::{EngineError, ExecutionAdapter, ExecutionResult};
pub use classifier::{CaseResultKind, SqlCaseResult, classify};
pub use config::{HarnessConfig, PostgresSettings};
pub use engine::{EngineKind, EngineProfile, PostgresProfile, SqliteProfile};
pub use report::{ConformanceReport, ReportRow, ReportSummary, RowOutcome};
pub use runner::{CaseOutcome, CasePlan, CaseRunner, plan_case, render_catalog};
pub use postgres_adapter::PostgresAdapter;
pub use sqlite_adapter::SqliteAdapter;
pub use statement::{BuildOutcome, SqlStatements, StatementBuilder, unique_table_name};
