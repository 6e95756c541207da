//! `veo-flow` command line runner.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use veo_client::VeoClient;
use veo_models::{JobStatus, ReferenceImage, RunState, VideoMode};
use veo_orchestrator::{
    extract_bracketed_prompts, metrics, HistorySink, InMemoryHistory, JsonlHistory, Orchestrator,
    OrchestratorConfig, RunReport, RunRequest, TracingNotifier,
};

#[derive(Parser)]
#[command(name = "veo-flow", version, about = "Orchestrate Veo video generation runs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate videos from a script, one prompt per line
    Run(RunArgs),
    /// Print the bracketed shot prompts of a drafted script, one per line
    Extract {
        /// Drafted script file
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Script file, one prompt per line
    #[arg(long)]
    script: PathBuf,
    /// Generation mode: text, image, interpolation or consistency
    #[arg(long, default_value = "text")]
    mode: VideoMode,
    #[arg(long, value_enum, default_value_t = PlanArg::Chained)]
    plan: PlanArg,
    /// Reference image, repeat for several
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    /// Text the video should avoid (text mode only)
    #[arg(long)]
    negative: Option<String>,
    /// Append successful jobs to this JSON Lines file
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlanArg {
    /// One continuous chained sequence
    Chained,
    /// Independent jobs, one after another
    Sequential,
    /// Every script line runs in its own lane
    Concurrent,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => match metrics::init_metrics(addr) {
                Ok(()) => info!("Metrics listening on {}", addr),
                Err(e) => warn!("Failed to start metrics exporter: {}", e),
            },
            Err(e) => warn!("Ignoring invalid METRICS_ADDR '{}': {}", addr, e),
        }
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Extract { input } => {
            let text = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            for prompt in extract_bracketed_prompts(&text) {
                println!("{}", prompt);
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("veo_orchestrator=info,veo_client=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let script = tokio::fs::read_to_string(&args.script)
        .await
        .with_context(|| format!("reading {}", args.script.display()))?;

    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        images.push(load_image(path).await?);
    }

    let mut request = match args.plan {
        PlanArg::Chained => RunRequest::chained(args.mode, script),
        PlanArg::Sequential => RunRequest::sequential(args.mode, script),
        PlanArg::Concurrent => RunRequest::concurrent(args.mode, script.lines().map(String::from).collect()),
    }
    .with_references(images);
    if let Some(negative) = args.negative {
        request = request.with_negative_prompt(negative);
    }

    let history: Arc<dyn HistorySink> = match &args.history {
        Some(path) => Arc::new(JsonlHistory::new(path)),
        None => Arc::new(InMemoryHistory::new()),
    };

    let client = VeoClient::from_env().context("creating Veo client")?;
    let config = OrchestratorConfig::from_env().context("reading orchestrator config")?;
    info!("Orchestrator config: {:?}", config);

    let orchestrator = Orchestrator::new(Arc::new(client), config)
        .with_notifier(Arc::new(TracingNotifier))
        .with_history(history);
    let handle = orchestrator.start(request)?;

    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, no further jobs will be submitted");
            canceller.request_cancel();
        }
    });

    let mut state = handle.subscribe_state();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            match *state.borrow_and_update() {
                RunState::Stopping { remaining } => info!(remaining, "Waiting for in-flight jobs"),
                RunState::Finished { .. } => break,
                RunState::Running => {}
            }
        }
    });

    let report = handle.wait().await?;
    print_report(&report);
    Ok(())
}

async fn load_image(path: &Path) -> Result<ReferenceImage> {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => bail!("unsupported image type: {}", path.display()),
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ReferenceImage::new(name, mime, bytes))
}

fn print_report(report: &RunReport) {
    println!(
        "Run {} {:?}: {} succeeded, {} failed",
        report.run_id,
        report.outcome,
        report.succeeded(),
        report.failed()
    );
    for lane in &report.lanes {
        for job in &lane.jobs {
            let detail = match (&job.status, &job.result_asset) {
                (JobStatus::Succeeded, Some(asset)) => asset.url(),
                _ => job.error_message.clone().unwrap_or_default(),
            };
            println!("  lane {} #{} [{}] {} -> {}", lane.lane_id, job.sequence + 1, job.status, job.prompt, detail);
        }
        if lane.skipped > 0 {
            println!("  lane {}: {} prompt(s) not submitted", lane.lane_id, lane.skipped);
        }
    }
    if let Some(handle) = report.final_output() {
        println!("Continue the sequence from: {}", handle.uri);
    }
}
