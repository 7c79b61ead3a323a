use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use fnconf_dialect::{DialectLibrary, ResolutionMode};
use fnconf_error::ConformanceError;
use fnconf_harness::catalog::{load_cases, load_dialect_file};
use fnconf_harness::logging::init_logging;
use fnconf_harness::report::render_failure_diagnostics;
use fnconf_harness::{
    CaseRunner, ConformanceReport, EngineKind, HarnessConfig, PostgresAdapter, SqliteAdapter,
    render_catalog,
};
use tracing::info;

#[derive(Debug)]
struct CliConfig {
    dialect_path: PathBuf,
    cases_path: PathBuf,
    engine: Option<EngineKind>,
    sqlite_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    dry_run: bool,
    diagnostic: bool,
    unique_tables: bool,
    log: LogOptions,
}

#[derive(Debug, Default, Clone, Copy)]
struct LogOptions {
    verbose: bool,
    json: bool,
}

fn print_help() {
    let help = "\
conformance_gate: run a function case catalog against one dialect

USAGE:
    cargo run -p fnconf-harness --bin conformance_gate -- --dialect <PATH> --cases <PATH> [OPTIONS]

OPTIONS:
    --dialect <PATH>       Dialect document (.json or .toml)
    --cases <PATH>         Case catalog (.json, .jsonl or .toml)
    --engine <NAME>        sqlite | postgres (default: $FNCONF_ENGINE or sqlite)
    --sqlite-path <PATH>   SQLite database (default: $FNCONF_SQLITE_PATH or :memory:)
    --dry-run              Render SQL into the report without executing it
    --diagnostic           Report functions missing from the dialect as skips
    --unique-tables        Use a per-case table name instead of the shared default
    --output <PATH>        Write JSON report to path (stdout when omitted)
    -v, --verbose          Debug-level logging (RUST_LOG overrides)
    --log-json             Emit logs as JSON lines on stderr
    -h, --help             Show this help

ENVIRONMENT:
    POSTGRES_HOST, POSTGRES_DB, POSTGRES_USER, POSTGRES_PASSWORD
                           Postgres connection (default: localhost, bft, postgres, postgres)

EXIT CODES:
    0  every executed case passed
    1  at least one mismatch, error or unexpected pass
    2  usage error, unreadable input or malformed dialect metadata
";
    println!("{help}");
}

fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    let mut dialect_path: Option<PathBuf> = None;
    let mut cases_path: Option<PathBuf> = None;
    let mut engine: Option<EngineKind> = None;
    let mut sqlite_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut dry_run = false;
    let mut diagnostic = false;
    let mut unique_tables = false;
    let mut log = LogOptions::default();

    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "--dialect" | "--cases" | "--engine" | "--sqlite-path" | "--output" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    return Err(format!("{flag} requires a value"));
                };
                match flag {
                    "--dialect" => dialect_path = Some(PathBuf::from(value)),
                    "--cases" => cases_path = Some(PathBuf::from(value)),
                    "--engine" => {
                        engine = Some(value.parse().map_err(|error: ConformanceError| error.to_string())?);
                    }
                    "--sqlite-path" => sqlite_path = Some(PathBuf::from(value)),
                    _ => output_path = Some(PathBuf::from(value)),
                }
            }
            "--dry-run" => dry_run = true,
            "--diagnostic" => diagnostic = true,
            "--unique-tables" => unique_tables = true,
            "-v" | "--verbose" => log.verbose = true,
            "--log-json" => log.json = true,
            "-h" | "--help" => {
                print_help();
                return Err(String::new());
            }
            unknown => {
                return Err(format!("unknown option: {unknown}"));
            }
        }
        index += 1;
    }

    let dialect_path = dialect_path.ok_or_else(|| "--dialect is required".to_owned())?;
    let cases_path = cases_path.ok_or_else(|| "--cases is required".to_owned())?;
    Ok(CliConfig {
        dialect_path,
        cases_path,
        engine,
        sqlite_path,
        output_path,
        dry_run,
        diagnostic,
        unique_tables,
        log,
    })
}

fn harness_config(cli: &CliConfig) -> Result<HarnessConfig, ConformanceError> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(engine) = cli.engine {
        config.engine = engine;
    }
    if let Some(path) = &cli.sqlite_path {
        config.sqlite_path.clone_from(path);
    }
    if cli.diagnostic {
        config.mode = ResolutionMode::Diagnostic;
    }
    Ok(config)
}

fn build_report(cli: &CliConfig, config: &HarnessConfig) -> Result<ConformanceReport, ConformanceError> {
    let file = load_dialect_file(&cli.dialect_path)?;
    let name = file.name.clone();
    let library = DialectLibrary::with_mode([file], config.mode);
    let dialect = library.dialect(&name)?;
    let cases = load_cases(&cli.cases_path)?;
    info!(
        dialect = %name,
        dialect_type = dialect.kind(),
        functions = dialect.function_names().count(),
        mode = ?dialect.mode(),
        engine = %config.engine,
        in_memory = config.is_in_memory(),
        dry_run = cli.dry_run,
        cases = cases.len(),
        "starting conformance run"
    );

    if cli.dry_run {
        return render_catalog(dialect, config.engine.profile(), &cases);
    }
    match config.engine {
        EngineKind::Sqlite => {
            let adapter = SqliteAdapter::open(&config.sqlite_path)?;
            CaseRunner::new(dialect, adapter)
                .with_unique_tables(cli.unique_tables)
                .run_catalog(&cases)
        }
        EngineKind::Postgres => {
            let adapter = PostgresAdapter::connect(&config.postgres)?;
            CaseRunner::new(dialect, adapter)
                .with_unique_tables(cli.unique_tables)
                .run_catalog(&cases)
        }
    }
}

fn run(args: &[String]) -> Result<i32, String> {
    let cli = parse_args(args)?;
    init_logging(cli.log.verbose, cli.log.json);

    let config = harness_config(&cli).map_err(|error| error.to_string())?;
    let report = build_report(&cli, &config).map_err(|error| error.to_string())?;

    let payload = serde_json::to_string_pretty(&report)
        .map_err(|error| ConformanceError::internal(format!("report_serialize_failed: {error}")).to_string())?;

    if let Some(output_path) = &cli.output_path {
        std::fs::write(output_path, payload).map_err(|error| {
            format!(
                "report_write_failed path={} error={error}",
                output_path.display()
            )
        })?;
    } else {
        println!("{payload}");
    }

    if report.summary.overall_pass {
        return Ok(0);
    }

    for line in render_failure_diagnostics(&report) {
        eprintln!("FAIL {line}");
    }
    Ok(1)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(1) => ExitCode::from(1),
        Ok(_) => ExitCode::from(2),
        Err(error) if error.is_empty() => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("ERROR conformance_gate failed: {error}");
            ExitCode::from(2)
        }
    }
}
