//! Machine-readable conformance report consumed by scripts and the gate
//! binary.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::classifier::CaseResultKind;
use crate::statement::SqlStatements;

/// Schema version for report serialization.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Per-case row status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    NotApplicable,
    Skipped,
    /// Statements were rendered but not executed (dry run).
    Planned,
    Success,
    Mismatch,
    Error,
    UnexpectedPass,
    Unsupported,
}

impl RowOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Skipped => "skipped",
            Self::Planned => "planned",
            Self::Success => CaseResultKind::Success.as_str(),
            Self::Mismatch => CaseResultKind::Mismatch.as_str(),
            Self::Error => CaseResultKind::Error.as_str(),
            Self::UnexpectedPass => CaseResultKind::UnexpectedPass.as_str(),
            Self::Unsupported => CaseResultKind::Unsupported.as_str(),
        }
    }

    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Mismatch | Self::Error | Self::UnexpectedPass)
    }
}

impl From<CaseResultKind> for RowOutcome {
    fn from(kind: CaseResultKind) -> Self {
        match kind {
            CaseResultKind::Success => Self::Success,
            CaseResultKind::Mismatch => Self::Mismatch,
            CaseResultKind::Error => Self::Error,
            CaseResultKind::UnexpectedPass => Self::UnexpectedPass,
            CaseResultKind::Unsupported => Self::Unsupported,
        }
    }
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One case in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Abstract function name from the case.
    pub function: String,
    /// `name(arg types) -> expected`, e.g. `add(i8, i8) -> i8`.
    pub kernel: String,
    pub outcome: RowOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<SqlStatements>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub case_count: usize,
    pub not_applicable: usize,
    pub skipped: usize,
    pub planned: usize,
    pub success: usize,
    pub mismatch: usize,
    pub error: usize,
    pub unexpected_pass: usize,
    pub unsupported: usize,
    pub failure_count: usize,
    pub overall_pass: bool,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut summary = Self {
            case_count: rows.len(),
            ..Self::default()
        };
        for row in rows {
            let counter = match row.outcome {
                RowOutcome::NotApplicable => &mut summary.not_applicable,
                RowOutcome::Skipped => &mut summary.skipped,
                RowOutcome::Planned => &mut summary.planned,
                RowOutcome::Success => &mut summary.success,
                RowOutcome::Mismatch => &mut summary.mismatch,
                RowOutcome::Error => &mut summary.error,
                RowOutcome::UnexpectedPass => &mut summary.unexpected_pass,
                RowOutcome::Unsupported => &mut summary.unsupported,
            };
            *counter += 1;
        }
        summary.failure_count = summary.mismatch + summary.error + summary.unexpected_pass;
        summary.overall_pass = summary.failure_count == 0;
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceReport {
    pub schema_version: u32,
    pub dialect: String,
    pub engine: String,
    pub dry_run: bool,
    pub generated_unix_ms: u128,
    pub rows: Vec<ReportRow>,
    pub summary: ReportSummary,
}

impl ConformanceReport {
    pub fn new(
        dialect: impl Into<String>,
        engine: impl Into<String>,
        dry_run: bool,
        rows: Vec<ReportRow>,
    ) -> Self {
        let summary = ReportSummary::from_rows(&rows);
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            dialect: dialect.into(),
            engine: engine.into(),
            dry_run,
            generated_unix_ms: unix_time_ms(),
            rows,
            summary,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|row| row.outcome.is_failure())
    }
}

/// One line per failing row, `key=value` formatted for CI logs.
pub fn render_failure_diagnostics(report: &ConformanceReport) -> Vec<String> {
    report
        .failures()
        .map(|row| {
            format!(
                "dialect={} kernel={} outcome={} detail={}",
                report.dialect,
                row.kernel,
                row.outcome,
                row.detail.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

fn unix_time_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(function: &str, outcome: RowOutcome, detail: Option<&str>) -> ReportRow {
        ReportRow {
            function: function.to_owned(),
            kernel: format!("{function}(i32) -> i32"),
            outcome,
            detail: detail.map(str::to_owned),
            sql: None,
        }
    }

    #[test]
    fn summary_counts_and_gate() {
        let report = ConformanceReport::new(
            "sqlite",
            "sqlite",
            false,
            vec![
                row("abs", RowOutcome::Success, None),
                row("abs", RowOutcome::Unsupported, Some("interval")),
                row("sign", RowOutcome::NotApplicable, None),
                row("add", RowOutcome::Skipped, Some("no i8")),
            ],
        );
        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        assert_eq!(report.summary.case_count, 4);
        assert_eq!(report.summary.success, 1);
        assert_eq!(report.summary.unsupported, 1);
        assert_eq!(report.summary.failure_count, 0);
        assert!(report.summary.overall_pass);
        assert!(render_failure_diagnostics(&report).is_empty());
    }

    #[test]
    fn failures_are_rendered() {
        let report = ConformanceReport::new(
            "postgres",
            "sqlite",
            false,
            vec![
                row("abs", RowOutcome::Mismatch, Some("4")),
                row("div", RowOutcome::UnexpectedPass, None),
                row("abs", RowOutcome::Success, None),
            ],
        );
        assert!(!report.summary.overall_pass);
        assert_eq!(report.summary.failure_count, 2);
        assert_eq!(
            render_failure_diagnostics(&report),
            vec![
                "dialect=postgres kernel=abs(i32) -> i32 outcome=mismatch detail=4".to_owned(),
                "dialect=postgres kernel=div(i32) -> i32 outcome=unexpected_pass detail=-"
                    .to_owned(),
            ]
        );
    }

    #[test]
    fn json_shape() {
        let report = ConformanceReport::new("d", "sqlite", true, vec![row("f", RowOutcome::Planned, None)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"][0]["outcome"], "planned");
        assert!(json["rows"][0].get("detail").is_none());
        assert_eq!(json["summary"]["planned"], 1);
        let back: ConformanceReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
