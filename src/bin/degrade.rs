use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use degrade::media::{ffmpeg, io};
use degrade::pipeline::group_by_tier;
use degrade::{
    DegradeConfig, DegradeEngine, DegradeError, DegradeRequest, Fps, MediaInfo, MediaType,
    PipelineSpec, RawParams, StageTier,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "degrade", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered operations grouped by stage tier.
    List(ListArgs),
    /// Print metadata for an image file, a video container, or a frame directory.
    Info(InfoArgs),
    /// Apply one operation or a pipeline and write the result.
    Apply(ApplyArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MediaChoice {
    /// Directories and container files (mp4, mkv, ...) are videos, other files are images.
    Auto,
    Image,
    Video,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Only this tier (basic, intermediate, advanced).
    #[arg(long)]
    tier: Option<StageTier>,

    /// Only operations supporting this media type.
    #[arg(long)]
    media: Option<MediaType>,

    /// Print full descriptors (with parameter schemas) as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    path: PathBuf,

    #[arg(long, value_enum, default_value_t = MediaChoice::Auto)]
    media: MediaChoice,

    /// Frame rate assumed for frame directories and containers without one.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input image, video container, or directory of numbered frames.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path; for videos a container file (mp4, mkv, ...) or a frame directory.
    #[arg(long)]
    out: PathBuf,

    /// Single operation id.
    #[arg(long, conflicts_with = "pipeline", required_unless_present = "pipeline")]
    op: Option<String>,

    /// Parameters for `--op` as a JSON object.
    #[arg(long, requires = "op")]
    params: Option<String>,

    /// JSON file holding a request ({first, second, third}) or a pipeline ({steps, force_order}).
    #[arg(long)]
    pipeline: Option<PathBuf>,

    /// Engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep the listed step order instead of sorting by tier.
    #[arg(long, default_value_t = false)]
    force_order: bool,

    /// Abort the run after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = MediaChoice::Auto)]
    media: MediaChoice,

    /// Frame rate assumed for frame directories and containers without one.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
}

#[derive(serde::Serialize)]
struct ApplyReport<'a> {
    input: &'a Path,
    output: &'a Path,
    media_type: MediaType,
    degradation_types: &'a [String],
    original_size: u64,
    processed_size: u64,
    stats: degrade::RunStats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::List(args) => cmd_list(args),
        Command::Info(args) => cmd_info(args),
        Command::Apply(args) => cmd_apply(args),
    }
}

fn resolve_media(choice: MediaChoice, path: &Path) -> MediaType {
    match choice {
        MediaChoice::Image => MediaType::Image,
        MediaChoice::Video => MediaType::Video,
        MediaChoice::Auto if path.is_dir() || ffmpeg::is_container_path(path) => MediaType::Video,
        MediaChoice::Auto => MediaType::Image,
    }
}

/// Print the structured report to stderr before handing the error to anyhow.
fn reported(err: DegradeError) -> anyhow::Error {
    if let Ok(json) = serde_json::to_string(&err.report()) {
        eprintln!("{json}");
    }
    anyhow::Error::new(err)
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let engine = DegradeEngine::new(DegradeConfig::default()).map_err(reported)?;
    let registry = engine.registry();

    if args.json {
        let descriptors = registry.list(args.tier, args.media);
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    for (tier, descriptors) in group_by_tier(registry) {
        if args.tier.is_some_and(|t| t != tier) {
            continue;
        }
        let descriptors = descriptors
            .into_iter()
            .filter(|d| args.media.is_none_or(|m| d.supports(m)))
            .collect::<Vec<_>>();
        if descriptors.is_empty() {
            continue;
        }
        println!("{tier}:");
        for d in descriptors {
            let media = d
                .supported_media_types
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let params = d
                .parameter_schema
                .fields()
                .iter()
                .map(|f| f.name)
                .collect::<Vec<_>>()
                .join(", ");
            println!("  {:<14} [{media}] {params}", d.id);
        }
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let media = resolve_media(args.media, &args.path);
    let fps = Fps::from_f64(args.fps).map_err(reported)?;
    let info = MediaInfo::probe(&args.path, media, fps).map_err(reported)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn load_pipeline(args: &ApplyArgs) -> anyhow::Result<PipelineSpec> {
    let spec = match (&args.op, &args.pipeline) {
        (Some(op), _) => {
            let params = match &args.params {
                Some(text) => serde_json::from_str::<RawParams>(text)
                    .context("--params must be a JSON object")?,
                None => RawParams::new(),
            };
            DegradeRequest::single(op.clone(), params)
                .to_pipeline_spec()
                .map_err(reported)?
        }
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read pipeline '{}'", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parse pipeline '{}'", path.display()))?;
            if value.get("steps").is_some() {
                serde_json::from_value::<PipelineSpec>(value)
                    .with_context(|| format!("parse pipeline '{}'", path.display()))?
            } else {
                DegradeRequest::from_json_str(&text)
                    .and_then(|r| r.to_pipeline_spec())
                    .map_err(reported)?
            }
        }
        (None, None) => anyhow::bail!("either --op or --pipeline is required"),
    };
    Ok(if args.force_order {
        spec.with_force_order(true)
    } else {
        spec
    })
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => DegradeConfig::from_path(path).map_err(reported)?,
        None => DegradeConfig::default(),
    };
    let engine = DegradeEngine::new(config).map_err(reported)?;
    let spec = load_pipeline(&args)?;

    let media = resolve_media(args.media, &args.in_path);
    let fps = Fps::from_f64(args.fps).map_err(reported)?;
    let payload = io::load_media(&args.in_path, media, fps).map_err(reported)?;

    let control = match args.timeout_ms {
        Some(ms) => engine
            .run_control()
            .with_timeout(Duration::from_millis(ms)),
        None => engine.run_control(),
    };
    let outcome = engine
        .run_pipeline(payload, &spec, &control)
        .map_err(reported)?;

    io::save_media(&outcome.payload, &args.out).map_err(reported)?;

    let report = ApplyReport {
        input: &args.in_path,
        output: &args.out,
        media_type: media,
        degradation_types: &outcome.degradation_types,
        original_size: io::stored_size(&args.in_path).map_err(reported)?,
        processed_size: io::stored_size(&args.out).map_err(reported)?,
        stats: outcome.stats,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
