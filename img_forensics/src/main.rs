use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use forensic_core::batch::run_batch;
use forensic_core::error_handler::report_error;
use forensic_core::logging::{init_logging, log_operation_end, LogConfig};
use forensic_core::{
    compare, AnalysisRequest, ArchiveEntry, Artifact, ContentType, CredibilityAssessment,
    EngineConfig, ForensicEngine, FusionPolicy, ThreadConfig,
};
use img_forensics::loader::{collect_files, load_image};
use img_forensics::report;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BATCH_TEMPLATE: &str =
    "{spinner:.green} {prefix:.cyan.bold} ▕{bar:35.green/black}▏ {percent:>3}% • {pos}/{len} • ⏱️ {elapsed_precise} (ETA: {eta}) • {msg}";

#[derive(Parser)]
#[command(name = "imgforensics")]
#[command(version, about = "Image manipulation forensics and credibility scoring", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// JSON engine configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fusion policy (overrides the config file)
    #[arg(long, value_name = "additive|weighted")]
    policy: Option<FusionPolicy>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one image, or every image in a directory
    Analyze {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long)]
        recursive: bool,

        #[arg(short, long, value_enum, default_value = "human")]
        output: OutputFormat,

        #[command(flatten)]
        engine: EngineArgs,

        /// Archive reference image(s) for historical verification
        #[arg(long, value_name = "FILE")]
        reference: Vec<PathBuf>,

        /// Date the image claims to have been taken
        #[arg(long, value_name = "YYYY-MM-DD")]
        claimed_date: Option<NaiveDate>,
    },

    /// Compare two artifacts
    Compare {
        a: PathBuf,

        b: PathBuf,

        #[arg(long, value_enum, default_value = "image")]
        content_type: ContentArg,

        #[arg(short, long, value_enum, default_value = "human")]
        output: OutputFormat,
    },

    /// Analyze extracted video frames and aggregate the verdicts
    Frames {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Worker threads (default: sized from available cores)
        #[arg(short, long)]
        threads: Option<usize>,

        #[arg(short, long, value_enum, default_value = "human")]
        output: OutputFormat,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ContentArg {
    Image,
    Text,
    Audio,
}

impl From<ContentArg> for ContentType {
    fn from(arg: ContentArg) -> Self {
        match arg {
            ContentArg::Image => ContentType::Image,
            ContentArg::Text => ContentType::Text,
            ContentArg::Audio => ContentType::Audio,
        }
    }
}

/// Per-image inputs shared by every file of a run.
struct RunContext<'a> {
    engine: &'a ForensicEngine,
    config: &'a EngineConfig,
    archive: &'a [ArchiveEntry],
    claimed_date: Option<DateTime<Utc>>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    if let Err(e) = init_logging("imgforensics", LogConfig::default().with_level(level)) {
        eprintln!("⚠️  Logging disabled: {:#}", e);
    }

    let result = run(cli.command);
    if let Err(e) = &result {
        report_error(&**e);
    }
    result
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Analyze {
            input,
            recursive,
            output,
            engine,
            reference,
            claimed_date,
        } => {
            let config = engine_config(&engine)?;
            let archive = load_archive(&reference)?;
            let forensic_engine = ForensicEngine::default();
            let ctx = RunContext {
                engine: &forensic_engine,
                config: &config,
                archive: &archive,
                claimed_date: claimed_date
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc()),
            };

            if input.is_file() {
                let assessment = analyze_file(&ctx, &input)
                    .with_context(|| format!("Failed to analyze {}", input.display()))?;
                match output {
                    OutputFormat::Json => println!("{}", report::assessment_json(&input, &assessment)?),
                    OutputFormat::Human => print!("{}", report::render_assessment(&input, &assessment)),
                }
            } else if input.is_dir() {
                let files = collect_files(&input, recursive);
                run_directory(&ctx, &files, &ThreadConfig::default(), output, "Analyzing")?;
            } else {
                bail!("Input path does not exist: {}", input.display());
            }
        }

        Commands::Compare {
            a,
            b,
            content_type,
            output,
        } => {
            let first = load_artifact(&a, content_type)?;
            let second = load_artifact(&b, content_type)?;
            let result = compare(&first, &second, content_type.into())?;
            match output {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "a": a.display().to_string(),
                        "b": b.display().to_string(),
                        "result": result,
                    }))?
                ),
                OutputFormat::Human => print!("{}", report::render_comparison(&a, &b, &result)),
            }
        }

        Commands::Frames {
            dir,
            threads,
            output,
            engine,
        } => {
            if !dir.is_dir() {
                bail!("Frame directory does not exist: {}", dir.display());
            }
            let config = engine_config(&engine)?;
            let forensic_engine = ForensicEngine::default();
            let ctx = RunContext {
                engine: &forensic_engine,
                config: &config,
                archive: &[],
                claimed_date: None,
            };
            let thread_config = threads.map(ThreadConfig::fixed).unwrap_or_default();
            let files = collect_files(&dir, false);
            run_directory(&ctx, &files, &thread_config, output, "Frames")?;
        }
    }

    Ok(())
}

fn engine_config(args: &EngineArgs) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    config.validate()?;
    Ok(config)
}

fn load_archive(references: &[PathBuf]) -> anyhow::Result<Vec<ArchiveEntry>> {
    references
        .iter()
        .map(|path| {
            let loaded = load_image(path)
                .with_context(|| format!("Failed to load reference {}", path.display()))?;
            Ok(ArchiveEntry {
                id: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                artifact: Artifact::Image(loaded.raster),
                historical_date: None,
            })
        })
        .collect()
}

fn load_artifact(path: &Path, content_type: ContentArg) -> anyhow::Result<Artifact> {
    let artifact = match content_type {
        ContentArg::Image => Artifact::Image(
            load_image(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
                .raster,
        ),
        ContentArg::Text => Artifact::Text(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        ContentArg::Audio => Artifact::Audio(
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
    };
    Ok(artifact)
}

fn analyze_file(ctx: &RunContext<'_>, path: &Path) -> forensic_core::Result<CredibilityAssessment> {
    let loaded = load_image(path)?;
    let request = AnalysisRequest::new(&loaded.raster)
        .with_format(loaded.format)
        .with_metadata(&loaded.metadata)
        .with_archive(ctx.archive, ctx.claimed_date);
    ctx.engine.analyze(&request, ctx.config)
}

fn progress_bar(total: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(BATCH_TEMPLATE)
        .map(|s| s.progress_chars("█▓░").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_directory(
    ctx: &RunContext<'_>,
    files: &[PathBuf],
    thread_config: &ThreadConfig,
    output: OutputFormat,
    label: &str,
) -> anyhow::Result<()> {
    if files.is_empty() {
        bail!("No images found");
    }

    let start = Instant::now();
    let pb = progress_bar(files.len() as u64, label);
    let batch = run_batch(files, thread_config, |path| {
        let result = analyze_file(ctx, path);
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.inc(1);
        result
    })?;
    pb.finish_and_clear();
    log_operation_end(label, start.elapsed(), batch.summary.counts.failed == 0);

    match output {
        OutputFormat::Json => println!("{}", report::batch_json(&batch, files)?),
        OutputFormat::Human => print!("{}", report::render_batch(&batch, files, start.elapsed())),
    }
    Ok(())
}
