use aihcore::{summary, Pipeline, PipelineConfig, PipelineOutcome, Source};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Preprocess AIH admissions against the municipality table and report
/// categorical associations as JSON.
#[derive(Parser, Debug)]
#[command(name = "aihcore", version)]
struct Args {
    /// YAML pipeline config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Admissions table; `-` reads stdin
    #[arg(long)]
    admissions: Option<String>,

    /// Municipality reference table; `-` reads stdin
    #[arg(long)]
    reference: Option<String>,

    /// Categorical columns to associate (comma separated)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Also print numeric summaries
    #[arg(long)]
    describe: bool,
}

fn source_for(arg: Option<&str>, configured: &Path) -> Source {
    match arg {
        Some("-") => Source::stream("stdin", std::io::stdin()),
        Some(path) => Source::path(path),
        None => Source::path(configured),
    }
}

fn main() -> Result<ExitCode> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,aihcore=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.admissions.as_deref() == Some("-") && args.reference.as_deref() == Some("-") {
        bail!("only one table can be read from stdin");
    }

    // ─── 3) load + process ───────────────────────────────────────────
    let admissions = source_for(args.admissions.as_deref(), &config.admissions.path);
    let reference = source_for(args.reference.as_deref(), &config.reference.path);
    let pipeline = Pipeline::new(config);

    let dataset = match pipeline.prepare(admissions, reference)? {
        PipelineOutcome::Ready(ds) => ds,
        PipelineOutcome::AwaitingInput(missing) => {
            for m in &missing {
                warn!(role = %m.role, path = %m.path.display(), "input table not found");
            }
            println!("{}", serde_json::to_string_pretty(&json!({ "awaiting_input": missing }))?);
            return Ok(ExitCode::from(2));
        }
    };

    // ─── 4) associate + report ───────────────────────────────────────
    let columns = if args.columns.is_empty() && pipeline.config().association_columns.is_empty() {
        summary::categorical_columns(&dataset)
    } else {
        args.columns.clone()
    };
    let matrix = pipeline.associate(&dataset, &columns)?;

    let mut report = json!({
        "rows": dataset.num_rows(),
        "columns": dataset.column_names(),
        "association": &*matrix,
    });
    if args.describe {
        report["summary"] = serde_json::to_value(pipeline.describe::<&str>(&dataset, &[])?)?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(stats = ?pipeline.cache_stats(), "done");
    Ok(ExitCode::SUCCESS)
}
