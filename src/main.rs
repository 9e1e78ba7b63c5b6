use anyhow::Result;
use clap::{Parser, ValueEnum};
use gstack::backend::{self, BackendProfile};
use gstack::config::BuildConfig;
use gstack::gcp::client::{format_gcp_error, GcpClient};
use gstack::gcp::project;
use gstack::{emit, graph, vars};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Declarative GCP stack builder
#[derive(Parser, Debug)]
#[command(name = "gstack", version = gstack::VERSION, about, long_about = None)]
struct Args {
    /// GCP project to deploy into (overrides the project_id input)
    #[arg(short, long)]
    project: Option<String>,

    /// Region for regional resources (overrides the region input)
    #[arg(short, long)]
    region: Option<String>,

    /// Deployment environment; selects the remote state workspace
    #[arg(short, long)]
    environment: Option<String>,

    /// Additional input overrides as NAME=VALUE (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Stack configuration file (JSON or YAML) replacing the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the manifest to this file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Treat a missing or unrecognized environment as an error
    #[arg(long)]
    strict: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Logs go to a file so stdout stays clean for the manifest.
fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gstack started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gstack").join("gstack.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gstack").join("gstack.log");
    }
    PathBuf::from("gstack.log")
}

/// Merge the shorthand flags and --var entries into one override map.
fn collect_overrides(args: &Args) -> Result<HashMap<String, String>> {
    let mut overrides = HashMap::new();

    for entry in &args.vars {
        let Some((name, value)) = entry.split_once('=') else {
            anyhow::bail!("malformed --var `{entry}` (expected NAME=VALUE)");
        };
        overrides.insert(name.trim().to_string(), value.to_string());
    }

    if let Some(project) = &args.project {
        overrides.insert("project_id".to_string(), project.clone());
    }
    if let Some(region) = &args.region {
        overrides.insert("region".to_string(), region.clone());
    }
    if let Some(environment) = &args.environment {
        overrides.insert("environment".to_string(), environment.clone());
    }

    Ok(overrides)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    // Step 1: configuration and inputs
    let config = BuildConfig::load(args.config.as_deref())?;
    let overrides = collect_overrides(&args)?;
    let inputs = vars::resolve(&overrides, &vars::environment_overrides())?;

    tracing::info!(
        "Using project: {}, region: {}",
        inputs.project_id,
        inputs.region
    );

    // Step 2: backend selection
    let backend = backend::select(inputs.environment.as_deref(), &config.backend, args.strict)?;
    match &backend {
        BackendProfile::Remote {
            organization,
            workspace,
            ..
        } => tracing::info!("Remote backend: {}/{}", organization, workspace),
        BackendProfile::Local => tracing::info!("No remote backend, state stays local"),
    }

    // Step 3: project metadata lookup (hard precondition for naming)
    let client = GcpClient::new().await?;
    let project = match project::lookup_project(&client, &inputs.project_id).await {
        Ok(project) => project,
        Err(e) => {
            tracing::error!("Project lookup failed: {:?}", e);
            anyhow::bail!(
                "cannot resolve project `{}`: {}",
                inputs.project_id,
                format_gcp_error(&e)
            );
        }
    };
    tracing::info!(
        "Resolved project {} (number {})",
        project.name,
        project.project_number
    );

    // Step 4: build and validate the resource graph
    let stack = graph::builder::build(&inputs, &project, &config)?;
    stack.graph.validate()?;
    tracing::info!("Built {} resources", stack.graph.len());

    // Step 5: emit
    let manifest = emit::render(&stack, &inputs, &backend)?;
    emit::write_manifest(&manifest, args.out.as_deref())?;
    emit::report_outputs(&stack);

    Ok(())
}
