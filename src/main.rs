//! shelfscan - a concurrent media library folder scanner.
//!
//! Usage:
//!   shelfscan scan [ROOTS]...       Scan library roots and print JSON
//!   shelfscan run --config FILE     Run the scan jobs described by a job file
//!   shelfscan --help                Show help

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

use shelfscan_core::{ContentKind, ErrorPolicy, ScanOptions, ScanResult};
use shelfscan_scan::{MediaScanner, ScanRoot};

#[derive(Parser)]
#[command(
    name = "shelfscan",
    version,
    about = "A concurrent media library folder scanner",
    long_about = "shelfscan walks media library roots laid out as\n\
                  <root>/<group>/<title> and reports every title's kind,\n\
                  icon and metadata status as deterministic JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan one or more library roots
    Scan {
        /// Library roots to scan
        #[arg(required = true)]
        roots: Vec<PathBuf>,

        /// Content kind of the roots
        #[arg(short, long, default_value = "movies")]
        content: ContentArg,

        /// Source label per root, matched positionally; repeat per root
        #[arg(short, long)]
        label: Vec<String>,

        /// Number of groups scanned concurrently
        #[arg(short = 'j', long, default_value = "4")]
        concurrency: usize,

        /// Skip title folders with no entries at all
        #[arg(long)]
        skip_empty: bool,

        /// Report only directories with no subdirectories
        #[arg(long)]
        only_leaf: bool,

        /// Include hidden (dot) directories
        #[arg(long)]
        hidden: bool,

        /// Glob patterns a title name must match
        #[arg(long = "include")]
        include_patterns: Vec<String>,

        /// Glob patterns that exclude a title by name
        #[arg(long = "exclude")]
        exclude_patterns: Vec<String>,

        /// Attach walk statistics to the output
        #[arg(long)]
        stats: bool,

        /// Capture each skipped error in the statistics
        #[arg(long)]
        errors: bool,

        /// Render progress on stderr while scanning
        #[arg(short, long)]
        progress: bool,

        /// Behavior on listing and stat errors
        #[arg(long, default_value = "skip")]
        on_error: ErrorArg,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Run the scan jobs described by a JSON job file
    Run {
        /// Path to the job file
        #[arg(short, long)]
        config: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ContentArg {
    #[default]
    Movies,
    Tv,
}

impl From<ContentArg> for ContentKind {
    fn from(value: ContentArg) -> Self {
        match value {
            ContentArg::Movies => ContentKind::Movies,
            ContentArg::Tv => ContentKind::Tv,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ErrorArg {
    Stop,
    #[default]
    Skip,
    Propagate,
}

impl From<ErrorArg> for ErrorPolicy {
    fn from(value: ErrorArg) -> Self {
        match value {
            ErrorArg::Stop => ErrorPolicy::Stop,
            ErrorArg::Skip => ErrorPolicy::Skip,
            ErrorArg::Propagate => ErrorPolicy::Propagate,
        }
    }
}

/// A job file loaded by `shelfscan run --config`. Jobs execute in order;
/// a top-level `concurrency` overrides each job's own setting.
#[derive(Debug, Deserialize)]
struct JobFile {
    #[serde(default)]
    concurrency: Option<usize>,
    jobs: Vec<ScanJob>,
}

#[derive(Debug, Deserialize)]
struct ScanJob {
    content: ContentKind,
    sources: Vec<JobSource>,
    #[serde(default)]
    output: Option<PathBuf>,
    #[serde(default)]
    options: Option<ScanOptions>,
}

#[derive(Debug, Deserialize)]
struct JobSource {
    path: PathBuf,
    #[serde(default)]
    label: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            roots,
            content,
            label,
            concurrency,
            skip_empty,
            only_leaf,
            hidden,
            include_patterns,
            exclude_patterns,
            stats,
            errors,
            progress,
            on_error,
            output,
            pretty,
        } => {
            let options = ScanOptions::builder()
                .concurrency(concurrency)
                .skip_empty_dirs(skip_empty)
                .only_leaf(only_leaf)
                .include_hidden(hidden)
                .include_patterns(include_patterns)
                .exclude_patterns(exclude_patterns)
                .collect_stats(stats)
                .collect_errors(errors)
                .enable_progress(progress)
                .error_policy(ErrorPolicy::from(on_error))
                .build()
                .context("Invalid scan options")?;

            let mut labels = label.into_iter();
            let roots: Vec<ScanRoot> = roots
                .into_iter()
                .map(|path| match labels.next() {
                    Some(label) => ScanRoot::labeled(path, label),
                    None => ScanRoot::new(path),
                })
                .collect();

            let result = run_scan(options, content.into(), roots, progress).await?;
            write_result(&result, output, pretty)?;
            print_summary(&result);
        }
        Command::Run { config, pretty } => {
            let raw = std::fs::read_to_string(&config)
                .with_context(|| format!("Cannot read job file {}", config.display()))?;
            let file: JobFile = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid job file {}", config.display()))?;

            for job in file.jobs {
                let mut options = job.options.unwrap_or_default();
                if let Some(concurrency) = file.concurrency {
                    options.concurrency = concurrency;
                }
                let roots: Vec<ScanRoot> = job
                    .sources
                    .into_iter()
                    .map(|source| match source.label {
                        Some(label) => ScanRoot::labeled(source.path, label),
                        None => ScanRoot::new(source.path),
                    })
                    .collect();

                let progress = options.enable_progress;
                let result = run_scan(options, job.content, roots, progress).await?;
                write_result(&result, job.output, pretty)?;
                print_summary(&result);
            }
        }
    }

    Ok(())
}

/// Run one scan with Ctrl-C cancellation and optional stderr progress.
async fn run_scan(
    options: ScanOptions,
    content: ContentKind,
    roots: Vec<ScanRoot>,
    progress: bool,
) -> Result<ScanResult> {
    let scanner = MediaScanner::new(options).context("Invalid scan options")?;

    let cancel = scanner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            cancel.cancel();
        }
    });

    let render = progress.then(|| {
        let mut progress_rx = scanner.subscribe();
        tokio::spawn(async move {
            while let Ok(progress) = progress_rx.recv().await {
                eprint!(
                    "\r[{}/{}] {:<40}",
                    progress.groups_done, progress.groups_total, progress.current_group
                );
                if progress.is_complete() {
                    eprintln!();
                    break;
                }
            }
        })
    });

    let result = scanner.scan(content, &roots).await.context("Scan failed");
    if let Some(render) = render {
        render.abort();
    }
    result
}

/// Write the result as JSON to a file or stdout.
fn write_result(result: &ScanResult, output: Option<PathBuf>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Print a short human summary on stderr.
fn print_summary(result: &ScanResult) {
    eprintln!(
        "{} titles in {} groups ({:.2}s)",
        result.total_items,
        result.group_count,
        result.scan_duration_ms as f64 / 1000.0
    );
    if let Some(stats) = &result.stats {
        eprintln!(
            "{} entries visited, {} skipped, {} errors, {} on disk",
            stats.entries_visited,
            stats.skipped,
            stats.errors_count,
            humansize::format_size(stats.total_size, humansize::BINARY)
        );
    }
}
