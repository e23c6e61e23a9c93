mod loader;
mod logging;
mod output;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use schemagate_core::{
    build_model, validate, DependencyGraph, GraphSummary, Model, ValidationReport,
};
use schemagate_emit::{emit_gateway_source, emit_sql, EmitError, QuoteStyle};
use serde::Serialize;
use thiserror::Error;

use loader::load_schema_tree;
use logging::init_logging;
use output::write_output;
use settings::GenerateSettings;

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("{0}")]
    Model(#[from] schemagate_core::Error),
    #[error("{0}")]
    Emit(#[from] EmitError),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("schema check failed with {0} error(s)")]
    CheckFailed(usize),
}

#[derive(Parser, Debug)]
#[command(
    name = "schemagate",
    version,
    about = "Generate SQL DDL and data gateway classes from a schema file"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check foreign key references and dependency cycles.
    Check(CheckArgs),
    /// Print CREATE TABLE statements.
    Sql(GenerateArgs),
    /// Print PHP gateway classes.
    Gateway(GenerateArgs),
    /// Print the built model and its table order as JSON.
    Inspect(ModelArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Schema file (YAML, JSON or TOML).
    #[arg(short = 'm', long, value_name = "FILE")]
    model_file: PathBuf,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Exit with an error when any violation is found.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    model: ModelArgs,
    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Generator settings file (TOML).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Leave the generation timestamp out of the header.
    #[arg(long, default_value_t = false)]
    no_timestamp: bool,
    /// Identifier quoting.
    #[arg(long, value_enum)]
    quote: Option<QuoteArg>,
    /// Default page size of generated paged queries.
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QuoteArg {
    Backtick,
    Double,
}

impl From<QuoteArg> for QuoteStyle {
    fn from(arg: QuoteArg) -> Self {
        match arg {
            QuoteArg::Backtick => QuoteStyle::Backtick,
            QuoteArg::Double => QuoteStyle::Double,
        }
    }
}

#[derive(Clone, Copy)]
enum Target {
    Sql,
    Gateway,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json).map_err(CliError::Logging)?;

    let timer = Instant::now();
    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Sql(args) => run_generate(args, Target::Sql),
        Command::Gateway(args) => run_generate(args, Target::Gateway),
        Command::Inspect(args) => run_inspect(args),
    };

    let duration_ms = timer.elapsed().as_millis();
    match &result {
        Ok(()) => tracing::info!(event = "run_finished", status = "success", duration_ms),
        Err(err) => {
            tracing::error!(event = "run_finished", status = "failed", duration_ms, error = %err)
        }
    }
    result
}

fn load_model(args: &ModelArgs) -> Result<Model, CliError> {
    let tree = load_schema_tree(&args.model_file)?;
    let model = build_model(&tree)?;
    tracing::info!(
        event = "model_loaded",
        path = %args.model_file.display(),
        tables = model.tables.len()
    );
    Ok(model)
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let model = load_model(&args.model)?;
    let report = validate(&model);
    write_output(None, &check_summary(&report))?;
    check_status(&report, args.strict)
}

/// One `ERROR:` line per issue followed by the error count.
fn check_summary(report: &ValidationReport) -> String {
    let mut text = String::new();
    for message in report.messages() {
        text.push_str(&message);
        text.push('\n');
    }
    text.push_str(&format!("number of errors found: {}\n", report.error_count()));
    text
}

fn check_status(report: &ValidationReport, strict: bool) -> Result<(), CliError> {
    if strict && !report.is_ok() {
        return Err(CliError::CheckFailed(report.error_count()));
    }
    Ok(())
}

fn run_generate(args: GenerateArgs, target: Target) -> Result<(), CliError> {
    let settings = GenerateSettings::load(args.config.as_deref())?;
    let options = settings.emit_options(
        args.quote.map(QuoteStyle::from),
        args.page_size,
        args.no_timestamp,
    )?;
    let model = load_model(&args.model)?;

    let text = match target {
        Target::Sql => emit_sql(&model, &options)?,
        Target::Gateway => emit_gateway_source(&model, &options)?,
    };
    write_output(args.out.as_deref(), &text)?;
    if let Some(out) = &args.out {
        tracing::info!(event = "output_written", path = %out.display(), bytes = text.len());
    }
    Ok(())
}

#[derive(Serialize)]
struct InspectReport<'a> {
    order: Option<Vec<String>>,
    graph: Option<GraphSummary>,
    error: Option<String>,
    model: &'a Model,
}

fn run_inspect(args: ModelArgs) -> Result<(), CliError> {
    let model = load_model(&args)?;

    let resolved = DependencyGraph::build(&model.tables)
        .and_then(|graph| graph.toposort().map(|order| (order, graph.summary())));
    let report = match resolved {
        Ok((order, graph)) => InspectReport {
            order: Some(order),
            graph: Some(graph),
            error: None,
            model: &model,
        },
        Err(err) => InspectReport {
            order: None,
            graph: None,
            error: Some(err.to_string()),
            model: &model,
        },
    };

    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    write_output(None, &json)?;
    Ok(())
}
