mod progress;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use pathtrace_core::{
    CoordinateFrame, ExportConfig, Trace, load_trace, prepare_exports, write_exports,
};

use crate::progress::{RootProgress, create_spinner};

/// CLI wrapper for CoordinateFrame (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliFrame {
    Local,
    Absolute,
}

impl From<CliFrame> for CoordinateFrame {
    fn from(cli: CliFrame) -> Self {
        match cli {
            CliFrame::Local => CoordinateFrame::Local,
            CliFrame::Absolute => CoordinateFrame::Absolute,
        }
    }
}

#[derive(Parser)]
#[command(name = "pathtrace")]
#[command(about = "Inspect object path traces and export per-object motion paths")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print object, avatar and root counts of a trace
    Summary {
        /// Trace file (JSON array of event records)
        trace: PathBuf,
    },

    /// Print every event of one object as JSON
    Events {
        /// Object UUID
        object_id: Uuid,

        /// Trace file (JSON array of event records)
        trace: PathBuf,
    },

    /// Write one motion path file per root object
    Export(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Trace file (JSON array of event records)
    trace: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "paths")]
    out: PathBuf,

    /// JSON export config; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Distance under which consecutive positions are merged
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Skip paths with fewer waypoints than this after squeezing
    #[arg(long)]
    min_waypoints: Option<usize>,

    /// Coordinate frame for child objects
    #[arg(long)]
    frame: Option<CliFrame>,

    /// Also treat objects added both with and without a parent as roots
    #[arg(long)]
    include_ambiguous: bool,

    /// Maximum events per cluster (0 disables clustering)
    #[arg(long)]
    cluster_events: Option<usize>,

    /// Resample exported paths every SECS seconds
    #[arg(long, value_name = "SECS")]
    resample: Option<f64>,
}

impl ExportArgs {
    /// File values first, then flag overrides, validated once at the end.
    async fn export_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load(path)
                .await
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ExportConfig::default(),
        };

        if let Some(tolerance) = self.tolerance {
            config.squeeze_tolerance = tolerance;
        }
        if let Some(min_waypoints) = self.min_waypoints {
            config.min_waypoints = min_waypoints;
        }
        if let Some(frame) = self.frame {
            config.frame = frame.into();
        }
        if self.include_ambiguous {
            config.include_ambiguous_roots = true;
        }
        if let Some(cluster_events) = self.cluster_events {
            config.cluster_events = cluster_events;
        }
        if self.resample.is_some() {
            config.resample_interval = self.resample;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Summary { trace } => summary(&trace).await,
        Command::Events { object_id, trace } => events(object_id, &trace).await,
        Command::Export(args) => export(args).await,
    }
}

async fn read_trace(path: &Path) -> Result<Trace> {
    load_trace(path, None)
        .await
        .with_context(|| format!("failed to load trace {}", path.display()))
}

async fn summary(path: &Path) -> Result<()> {
    let mut trace = read_trace(path).await?;
    let fill = trace.fill_parents();
    let summary = trace.summary();

    println!(
        "\n{}  {}\n",
        style("pathtrace").cyan().bold(),
        style("Trace Summary").dim()
    );
    println!("{} {}", style("Trace file:").dim(), style(path.display()).cyan());
    if let Some(started_at) = trace.started_at() {
        println!("{} {}", style("Started:").dim(), started_at);
    }
    println!("{} {}", style("Events:").dim(), summary.events);
    println!("{} {}", style("Objects:").dim(), summary.objects);
    println!("{} {}", style("Avatars:").dim(), summary.avatars);
    println!("{} {}", style("Root objects:").dim(), summary.roots);

    if fill.unresolved > 0 {
        println!(
            "{} {} objects with a local parent id but no matching parent",
            style("!").yellow().bold(),
            fill.unresolved
        );
    }
    Ok(())
}

async fn events(object_id: Uuid, path: &Path) -> Result<()> {
    let mut trace = read_trace(path).await?;
    trace.fill_parents();

    let sub = trace.subtrace(object_id);
    debug!(%object_id, events = sub.len(), "selected object events");

    let records: Vec<Value> = sub.iter().map(|event| event.to_record()).collect();
    println!("{}", serde_json::to_string_pretty(&Value::Array(records))?);
    Ok(())
}

async fn export(args: ExportArgs) -> Result<()> {
    let config = match args.export_config().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    println!(
        "\n{}  {}\n",
        style("pathtrace").cyan().bold(),
        style("Motion Path Export").dim()
    );

    let spinner = create_spinner("Loading trace...")?;
    let mut trace = read_trace(&args.trace).await?;
    spinner.finish_with_message(format!(
        "{} Loaded {} events",
        style("✓").green().bold(),
        trace.len()
    ));

    let mut bar = RootProgress::new("Assembling motion paths")?;
    let prepared = prepare_exports(&mut trace, &config, &mut bar)?;

    let spinner = create_spinner("Writing motion paths...")?;
    let written = write_exports(&args.out, &prepared)
        .await
        .with_context(|| format!("failed to write into {}", args.out.display()))?;
    spinner.finish_with_message(format!(
        "{} Wrote {} paths {}",
        style("✓").green().bold(),
        written.len(),
        style(format!("({} frame)", config.frame.name())).dim()
    ));

    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(args.out.display()).cyan()
    );
    Ok(())
}
