//! Drive cases through resolution, building, execution and classification.

use fnconf_dialect::{Dialect, Resolution, SqlMapping};
use fnconf_error::Result;
use fnconf_types::{Case, LiteralType};
use tracing::{debug, error, info};

use crate::adapter::ExecutionAdapter;
use crate::classifier::{SqlCaseResult, classify};
use crate::engine::EngineProfile;
use crate::report::{ConformanceReport, ReportRow, RowOutcome};
use crate::statement::{BuildOutcome, SqlStatements, StatementBuilder, unique_table_name};

/// What happened to one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// The dialect does not declare the function.
    NotApplicable,
    /// The dialect declares the function but rejects this kernel or option
    /// set; nothing was executed.
    Skipped { reason: String },
    Completed(SqlCaseResult),
}

/// A case that has been resolved and, where possible, built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasePlan {
    NotApplicable,
    Skipped { reason: String },
    Unsupported(LiteralType),
    Execute {
        mapping: SqlMapping,
        statements: SqlStatements,
    },
}

/// Resolve `case` against `dialect` and build its statements for `profile`.
///
/// Dialect defects (kernel arity, kernel result type, shape arity) are
/// returned as errors.
pub fn plan_case(
    dialect: &Dialect,
    profile: &dyn EngineProfile,
    case: &Case,
    table_name: Option<&str>,
) -> Result<CasePlan> {
    let mapping = match dialect.mapping_for_case(case)? {
        Resolution::NotApplicable => return Ok(CasePlan::NotApplicable),
        Resolution::Skip(reason) => {
            return Ok(CasePlan::Skipped {
                reason: reason.to_string(),
            });
        }
        Resolution::Mapped(mapping) => mapping,
    };
    if !mapping.should_pass {
        let reason = mapping
            .reason
            .unwrap_or_else(|| format!("{} rejects {}", dialect.name(), case.kernel_signature()));
        return Ok(CasePlan::Skipped { reason });
    }

    let mut builder = StatementBuilder::new(profile);
    if let Some(table_name) = table_name {
        builder = builder.with_table_name(table_name);
    }
    Ok(match builder.build(&mapping, case)? {
        BuildOutcome::UnsupportedType(ty) => CasePlan::Unsupported(ty),
        BuildOutcome::Statements(statements) => CasePlan::Execute {
            mapping,
            statements,
        },
    })
}

/// Runs cases for one dialect on one adapter.
pub struct CaseRunner<'d, A> {
    dialect: &'d Dialect,
    adapter: A,
    unique_tables: bool,
}

impl<'d, A: ExecutionAdapter> CaseRunner<'d, A> {
    pub fn new(dialect: &'d Dialect, adapter: A) -> Self {
        Self {
            dialect,
            adapter,
            unique_tables: false,
        }
    }

    /// Give every case its own table name instead of the shared default.
    #[must_use]
    pub fn with_unique_tables(mut self, unique_tables: bool) -> Self {
        self.unique_tables = unique_tables;
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    pub fn run_case(&mut self, case: &Case) -> Result<CaseOutcome> {
        self.run_planned(case).map(|(outcome, _)| outcome)
    }

    fn run_planned(&mut self, case: &Case) -> Result<(CaseOutcome, Option<SqlStatements>)> {
        let table_name = self.unique_tables.then(|| unique_table_name(case));
        let plan = plan_case(
            self.dialect,
            self.adapter.profile(),
            case,
            table_name.as_deref(),
        )
        .inspect_err(|err| {
            error!(
                dialect = self.dialect.name(),
                function = %case.function,
                error = %err,
                "dialect defect"
            );
        })?;

        let (mapping, statements) = match plan {
            CasePlan::NotApplicable => return Ok((CaseOutcome::NotApplicable, None)),
            CasePlan::Skipped { reason } => {
                debug!(
                    dialect = self.dialect.name(),
                    function = %case.function,
                    reason = %reason,
                    "case skipped"
                );
                return Ok((CaseOutcome::Skipped { reason }, None));
            }
            CasePlan::Unsupported(ty) => {
                return Ok((CaseOutcome::Completed(SqlCaseResult::unsupported(ty)), None));
            }
            CasePlan::Execute {
                mapping,
                statements,
            } => (mapping, statements),
        };

        let actual = self.adapter.run(&statements)?;
        let result = classify(&case.result, &actual);
        debug!(
            dialect = self.dialect.name(),
            function = %case.function,
            local_name = %mapping.local_name,
            kind = %result.kind,
            "case classified"
        );
        Ok((CaseOutcome::Completed(result), Some(statements)))
    }

    /// Run every case and aggregate the outcomes. The first dialect defect
    /// aborts the run.
    pub fn run_catalog(&mut self, cases: &[Case]) -> Result<ConformanceReport> {
        let mut rows = Vec::with_capacity(cases.len());
        for case in cases {
            let (outcome, statements) = self.run_planned(case)?;
            rows.push(report_row(case, outcome, statements));
        }
        let report = ConformanceReport::new(
            self.dialect.name(),
            self.adapter.profile().engine_name(),
            false,
            rows,
        );
        log_summary(&report);
        Ok(report)
    }
}

/// Build a report that renders each case's statements without executing
/// anything.
pub fn render_catalog(
    dialect: &Dialect,
    profile: &dyn EngineProfile,
    cases: &[Case],
) -> Result<ConformanceReport> {
    let mut rows = Vec::with_capacity(cases.len());
    for case in cases {
        let (outcome, detail, sql) = match plan_case(dialect, profile, case, None)? {
            CasePlan::NotApplicable => (RowOutcome::NotApplicable, None, None),
            CasePlan::Skipped { reason } => (RowOutcome::Skipped, Some(reason), None),
            CasePlan::Unsupported(ty) => (RowOutcome::Unsupported, Some(ty.to_string()), None),
            CasePlan::Execute { statements, .. } => (RowOutcome::Planned, None, Some(statements)),
        };
        rows.push(ReportRow {
            function: case.function.clone(),
            kernel: case.kernel_signature(),
            outcome,
            detail,
            sql,
        });
    }
    let report = ConformanceReport::new(dialect.name(), profile.engine_name(), true, rows);
    log_summary(&report);
    Ok(report)
}

fn report_row(case: &Case, outcome: CaseOutcome, sql: Option<SqlStatements>) -> ReportRow {
    let (outcome, detail) = match outcome {
        CaseOutcome::NotApplicable => (RowOutcome::NotApplicable, None),
        CaseOutcome::Skipped { reason } => (RowOutcome::Skipped, Some(reason)),
        CaseOutcome::Completed(result) => (result.kind.into(), result.detail),
    };
    ReportRow {
        function: case.function.clone(),
        kernel: case.kernel_signature(),
        outcome,
        detail,
        sql,
    }
}

fn log_summary(report: &ConformanceReport) {
    let summary = &report.summary;
    info!(
        dialect = %report.dialect,
        engine = %report.engine,
        dry_run = report.dry_run,
        cases = summary.case_count,
        success = summary.success,
        failures = summary.failure_count,
        skipped = summary.skipped,
        not_applicable = summary.not_applicable,
        unsupported = summary.unsupported,
        overall_pass = summary.overall_pass,
        "conformance run finished"
    );
}
