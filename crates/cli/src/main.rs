//! scriptorium - align page scans with their transcription
//!
//! Usage:
//!   scriptorium parse <file>              Parsed lines as JSON lines, anomalies on stderr
//!   scriptorium segment <image>           Page -> line -> word -> glyph hierarchy as JSON
//!   scriptorium run --transliteration <file> --pages <dir> --out <dir>
//!                                         Full run, records written as JSON lines tables

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scriptorium_pipeline::{load_config, run_directory, JsonlSink, PipelineConfig};
use scriptorium_segmentation::Segmenter;
use scriptorium_transliteration::{ParseOutput, TransliterationSource};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File the run report is written to inside the output directory
const REPORT_FILE: &str = "report.json";

#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(about = "Align manuscript page scans with their transcription")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More logging (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a transcription file
    Parse {
        /// Transcription file
        file: PathBuf,
    },
    /// Segment one page scan
    Segment {
        /// Page image
        image: PathBuf,

        /// Folio id (default: file stem)
        #[arg(long)]
        folio: Option<String>,

        /// TOML configuration; only the segmentation section is used
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Run every engine over a transcription and its page scans
    Run {
        /// Transcription file
        #[arg(long, value_name = "PATH")]
        transliteration: PathBuf,

        /// Directory of page scans named by folio (f1r.png, f1v.tif, ...)
        #[arg(long, value_name = "DIR")]
        pages: PathBuf,

        /// Output directory for the record tables and report
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// TOML configuration
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Run id (overrides the configuration)
        #[arg(long)]
        run_id: Option<String>,

        /// Sampling seed (overrides the configuration)
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads, 0 for one per core (overrides the configuration)
        #[arg(long)]
        threads: Option<usize>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn config_or_default(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(PipelineConfig::default()),
    }
}

/// Parsed lines to `out`, anomalies to `err`, one JSON object per line each
fn write_parse(output: &ParseOutput, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    for line in &output.lines {
        serde_json::to_writer(&mut *out, line)?;
        writeln!(out)?;
    }
    for anomaly in output.anomalies.iter() {
        serde_json::to_writer(&mut *err, anomaly)?;
        writeln!(err)?;
    }
    Ok(())
}

fn cmd_parse(file: &Path) -> Result<()> {
    let source = TransliterationSource::from_path(file)
        .with_context(|| format!("Failed to load transcription: {}", file.display()))?;
    let output = source.parse();
    info!(
        "Parsed {}: {} lines, {} anomalies",
        file.display(),
        output.lines.len(),
        output.anomalies.len()
    );
    write_parse(&output, &mut io::stdout().lock(), &mut io::stderr().lock())
}

fn folio_from_path(image: &Path) -> Result<String> {
    image
        .file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
        .with_context(|| format!("Cannot derive a folio id from {}", image.display()))
}

fn cmd_segment(image: &Path, folio: Option<String>, config: Option<&Path>) -> Result<()> {
    let config = config_or_default(config)?;
    let folio = match folio {
        Some(folio) => folio,
        None => folio_from_path(image)?,
    };
    let (_, segmentation) = Segmenter::new(config.segmentation)
        .segment_path(image, &folio)
        .with_context(|| format!("Failed to segment {}", image.display()))?;
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &segmentation)?;
    writeln!(stdout)?;
    Ok(())
}

struct RunArgs {
    transliteration: PathBuf,
    pages: PathBuf,
    out: PathBuf,
    config: Option<PathBuf>,
    run_id: Option<String>,
    seed: Option<u64>,
    threads: Option<usize>,
}

fn resolve_run_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = config_or_default(args.config.as_deref())?;
    if let Some(run_id) = &args.run_id {
        config.run.run_id = run_id.clone();
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if let Some(threads) = args.threads {
        config.run.threads = threads;
    }
    Ok(config)
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = resolve_run_config(args)?;
    let mut sink = JsonlSink::create(&args.out)
        .with_context(|| format!("Failed to create output directory: {}", args.out.display()))?;
    let report = run_directory(config, &args.transliteration, &args.pages, &mut sink)
        .with_context(|| {
            format!(
                "Run over {} and {} failed",
                args.transliteration.display(),
                args.pages.display()
            )
        })?;

    let report_json = serde_json::to_string_pretty(&report)?;
    let report_path = args.out.join(REPORT_FILE);
    std::fs::write(&report_path, &report_json)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
    println!("{report_json}");
    if report.partial_coverage {
        eprintln!(
            "{} anomalies recorded; coverage is partial (see {})",
            report.anomalies.len(),
            args.out.join(scriptorium_pipeline::sink::ANOMALIES_FILE).display()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse { file } => cmd_parse(&file),
        Commands::Segment {
            image,
            folio,
            config,
        } => cmd_segment(&image, folio, config.as_deref()),
        Commands::Run {
            transliteration,
            pages,
            out,
            config,
            run_id,
            seed,
            threads,
        } => cmd_run(&RunArgs {
            transliteration,
            pages,
            out,
            config,
            run_id,
            seed,
            threads,
        }),
    }
}
