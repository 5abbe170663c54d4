//! CLI command definitions, routing, and tracing setup.

use std::time::Duration;

use castgraph_core::pipeline::{
    PipelineConfig, PipelineReport, ProgressReporter, StageStatus, run_all, run_fetch, run_render,
};
use castgraph_shared::{AppConfig, config_file_path, init_config, load_config};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// castgraph: scrape character portraits and render the relationship graph.
#[derive(Parser)]
#[command(
    name = "castgraph",
    version,
    about = "Scrape character portraits from a fan wiki and render an interactive relationship graph.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run every stage: correct, enrich, merge, render.
    Run,

    /// Correct profile URLs, fetch portraits and write the merged table.
    Fetch,

    /// Render the graph document from an existing merged table.
    Render,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write `castgraph.toml` with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "castgraph=info",
        1 => "castgraph=debug",
        _ => "castgraph=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_pipeline(PipelineCommand::Run).await,
        Command::Fetch => cmd_pipeline(PipelineCommand::Fetch).await,
        Command::Render => cmd_pipeline(PipelineCommand::Render).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

#[derive(Debug, Clone, Copy)]
enum PipelineCommand {
    Run,
    Fetch,
    Render,
}

async fn cmd_pipeline(command: PipelineCommand) -> Result<()> {
    let config = load_config()?;
    let pipeline = PipelineConfig::from(&config);

    info!(
        ?command,
        characters = %pipeline.characters_path.display(),
        relationships = %pipeline.relationships_path.display(),
        layout = ?pipeline.graph.graph.layout,
        "starting"
    );

    let reporter = CliProgress::new();
    let report = match command {
        PipelineCommand::Run => run_all(&pipeline, &reporter).await,
        PipelineCommand::Fetch => run_fetch(&pipeline, &reporter).await,
        PipelineCommand::Render => run_render(&pipeline, &reporter),
    };

    print_summary(&report);

    if report.succeeded() {
        Ok(())
    } else {
        let failed: Vec<String> = report.failed_stages().iter().map(|s| s.to_string()).collect();
        Err(eyre!("stage(s) failed: {}", failed.join(", ")))
    }
}

fn print_summary(report: &PipelineReport) {
    println!();
    for outcome in &report.stages {
        let status = match &outcome.status {
            StageStatus::Succeeded => "ok".to_string(),
            StageStatus::Failed(reason) => format!("failed: {reason}"),
            StageStatus::Skipped(reason) => format!("skipped: {reason}"),
        };
        println!(
            "  {:<8} {:>6.1}s  {status}",
            outcome.stage.to_string(),
            outcome.elapsed.as_secs_f64()
        );
    }
    if let Some(counts) = &report.enrichment {
        println!(
            "  Portraits: {} resolved, {} missing, {} failed, {} without URL",
            counts.resolved, counts.missing, counts.failed, counts.skipped
        );
    }
    if let Some(render) = &report.render {
        println!(
            "  Graph:     {} nodes, {} edges -> {}",
            render.node_count,
            render.edge_count,
            render.path.display()
        );
    }
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn row_enriched(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching portraits [{current}/{total}] {name}"));
    }

    fn done(&self, _report: &PipelineReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let path = config_file_path()?;
    let toml_str = toml::to_string_pretty(&config)?;
    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# defaults ({} not found)", path.display());
    }
    println!("{toml_str}");
    Ok(())
}
