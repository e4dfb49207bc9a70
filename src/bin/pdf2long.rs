//! CLI binary for pdf2long.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, draws progress bars and turns library errors into
//! exit codes.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2long::{
    batch::{BatchItem, BatchOptions, BatchOutcome},
    convert_dir, convert_to_file, default_output_path, inspect, AlwaysOverwrite,
    BatchProgressCallback, CancelFlag, ConfirmOverwrite, ConversionConfig,
    ConversionProgressCallback, OutputFormat, Pdf2LongError, ProgressCallback, WidthPolicy,
    MAX_DPI, MIN_DPI,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn bar_style(unit: &str) -> ProgressStyle {
    ProgressStyle::with_template(&format!(
        "{{spinner:.cyan}} {{prefix:.bold}}  [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  ⏱ {{elapsed_precise}}"
    ))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(SPINNER)
}

// ── Single-document progress ─────────────────────────────────────────────────

/// Spinner while pdfium renders, then a bar over the normalised pages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER),
        );
        bar.set_prefix("Rendering");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
    }

    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(bar_style("pages"));
        self.bar.set_prefix("Processing");
        self.bar.reset_eta();
    }

    fn on_page_normalized(&self, page_num: usize, _total_pages: usize) {
        self.bar.set_position(page_num as u64);
    }

    fn on_composing(&self, total_pages: usize) {
        self.bar.set_prefix("Composing");
        self.bar.set_message(format!("{total_pages} pages"));
    }

    fn on_conversion_complete(&self, _width: u32, _height: u32) {
        self.bar.finish_and_clear();
    }
}

// ── Batch progress ───────────────────────────────────────────────────────────

struct CliBatchProgress {
    bar: ProgressBar,
}

impl CliBatchProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(bar_style("files"));
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliBatchProgress {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_complete(&self, completed: usize, total_files: usize, item: &BatchItem) {
        let name = item.input.display().to_string();
        let line = match &item.outcome {
            BatchOutcome::Converted { width, height } => format!(
                "  {} {}  {}",
                green("✓"),
                name,
                dim(&format!("{width}x{height}"))
            ),
            BatchOutcome::Skipped => format!("  {} {}  {}", yellow("–"), name, dim("exists")),
            BatchOutcome::Failed { error } => format!("  {} {}  {}", red("✗"), name, red(error)),
        };
        self.bar.println(line);
        self.bar.set_position(completed as u64);
        if completed == total_files {
            self.bar.finish_and_clear();
        }
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # One PDF → report_long_screenshot.png next to it
  pdf2long convert report.pdf

  # JPEG at 200 DPI with 20 px between pages, all pages the same width
  pdf2long convert slides.pdf -o slides.jpg -f jpeg --dpi 200 -s 20 --fixed-width

  # Every PDF under pdfs/ into images/, four at a time
  pdf2long batch -i pdfs -o images -j 4 --skip-existing

  # Page count and metadata only
  pdf2long inspect report.pdf --json

EXIT CODES:
  0    success
  1    invalid arguments or input file
  2    PDF could not be rendered (batch: at least one file failed)
  3    pages could not be composed
  4    output could not be written
  130  interrupted
  255  unexpected error

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. pdf2long=debug)
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory

  PDFium (~30 MB) is downloaded automatically on first run and cached.
"#;

/// Convert PDF documents into one long vertical image.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2long",
    version,
    about = "Convert PDF documents into one long vertical image",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2LONG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true, env = "PDF2LONG_QUIET")]
    quiet: bool,

    /// Disable progress bars.
    #[arg(long, global = true, env = "PDF2LONG_NO_PROGRESS")]
    no_progress: bool,

    /// Print results as JSON on stdout.
    #[arg(long, global = true, env = "PDF2LONG_JSON")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one PDF file.
    Convert(ConvertArgs),
    /// Convert every PDF in a directory.
    Batch(BatchArgs),
    /// Print page count and metadata without rendering.
    Inspect {
        /// PDF file to inspect.
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// PDF file to convert.
    input: PathBuf,

    /// Output image path (default: <input>_long_screenshot.<format>).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing output file without asking.
    #[arg(long, env = "PDF2LONG_NO_CONFIRM")]
    no_confirm: bool,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory to search for PDF files.
    #[arg(short = 'i', long, default_value = "pdfs")]
    input_dir: PathBuf,

    /// Directory to write images into, mirroring the input layout.
    #[arg(short = 'o', long, default_value = "images")]
    output_dir: PathBuf,

    /// Only look at PDFs directly inside the input directory.
    #[arg(long)]
    no_recursive: bool,

    /// Leave PDFs whose output image already exists alone.
    #[arg(long)]
    skip_existing: bool,

    /// Number of documents converted at the same time.
    #[arg(short, long, env = "PDF2LONG_JOBS", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..))]
    jobs: u16,

    #[command(flatten)]
    render: RenderArgs,
}

/// Flags shared by `convert` and `batch`.
#[derive(Args, Debug)]
struct RenderArgs {
    /// Rendering DPI (72–300).
    #[arg(long, env = "PDF2LONG_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(MIN_DPI as i64..=MAX_DPI as i64))]
    dpi: u32,

    /// Output image format: png, jpeg or jpg.
    #[arg(short, long, env = "PDF2LONG_FORMAT", default_value = "png",
          value_parser = OutputFormat::from_str)]
    format: OutputFormat,

    /// JPEG quality (1–100).
    #[arg(short, long, env = "PDF2LONG_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Blank pixels between pages.
    #[arg(short, long, env = "PDF2LONG_SPACING", default_value_t = 0)]
    spacing: u32,

    /// Give every page the width of the widest page, centred.
    #[arg(long, env = "PDF2LONG_FIXED_WIDTH")]
    fixed_width: bool,

    /// Keep white page borders.
    #[arg(long, env = "PDF2LONG_NO_CROP")]
    no_crop: bool,

    /// White pixels kept around the content when cropping.
    #[arg(long, env = "PDF2LONG_CROP_MARGIN", default_value_t = 10)]
    crop_margin: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2LONG_PASSWORD")]
    password: Option<String>,
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {:#}", red("Error:"), err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn init_tracing(cli: &Cli) {
    // The progress bar gives all the feedback that matters; keep library
    // INFO logs from tearing through it.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress(cli) {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose
}

/// Exit status for a failed run: the library error's kind when there is one
/// in the chain, 255 otherwise.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<Pdf2LongError>())
        .map(|e| e.exit_code())
        .unwrap_or(255)
        .clamp(0, 255) as u8
}

async fn run(cli: Cli) -> Result<u8> {
    ensure_pdfium(cli.quiet)?;

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n{}", yellow("Interrupted, stopping after the current page…"));
                cancel.cancel();
            }
            // A second Ctrl-C does not wait for the pipeline.
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    }

    match cli.command {
        Command::Inspect { ref input } => run_inspect(&cli, input).await,
        Command::Convert(ref args) => run_convert(&cli, args, cancel).await,
        Command::Batch(ref args) => run_batch(&cli, args, cancel).await,
    }
}

/// Make sure a pdfium library is available, downloading it on first run.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length() != Some(t) {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

async fn run_inspect(cli: &Cli, input: &Path) -> Result<u8> {
    let info = inspect(input).await.context("Failed to inspect PDF")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialise metadata")?
        );
    } else {
        println!("File:         {}", info.path.display());
        println!("Pages:        {}", info.page_count);
        println!("PDF Version:  {}", info.pdf_version);
        if let Some(ref t) = info.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = info.author {
            println!("Author:       {}", a);
        }
        if let Some(ref p) = info.producer {
            println!("Producer:     {}", p);
        }
    }
    Ok(0)
}

async fn run_convert(cli: &Cli, args: &ConvertArgs, cancel: CancelFlag) -> Result<u8> {
    let progress: Option<ProgressCallback> = if show_progress(cli) {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };
    let config = build_config(&args.render, progress, cancel)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, config.format));
    let confirm: &(dyn ConfirmOverwrite + Sync) = if args.no_confirm {
        &AlwaysOverwrite
    } else {
        &prompt_overwrite
    };

    let Some(stats) = convert_to_file(&args.input, &output, &config, confirm)
        .await
        .context("Conversion failed")?
    else {
        if !cli.quiet {
            eprintln!("{} Not overwriting {}", yellow("–"), output.display());
        }
        return Ok(0);
    };

    if cli.json {
        let json = serde_json::json!({ "output": output, "stats": stats });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}x{} px  {}ms  →  {}",
            green("✔"),
            stats.page_count,
            stats.width,
            stats.height,
            stats.total_duration_ms,
            bold(&output.display().to_string()),
        );
    }
    Ok(0)
}

async fn run_batch(cli: &Cli, args: &BatchArgs, cancel: CancelFlag) -> Result<u8> {
    // Several documents may be in flight, so per-page bars are off.
    let config = build_config(&args.render, None, cancel)?;
    let options = BatchOptions {
        recursive: !args.no_recursive,
        skip_existing: args.skip_existing,
        jobs: args.jobs as usize,
        progress: if show_progress(cli) {
            Some(CliBatchProgress::new() as Arc<dyn BatchProgressCallback>)
        } else {
            None
        },
    };

    let summary = convert_dir(&args.input_dir, &args.output_dir, &options, &config)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        if summary.total == 0 {
            eprintln!("{} No PDF files found in {}", yellow("–"), args.input_dir.display());
        } else {
            eprintln!(
                "{}  {} converted  {} skipped  {} failed  of {}  →  {}",
                if summary.failed == 0 { green("✔") } else { red("✘") },
                summary.converted,
                summary.skipped,
                summary.failed,
                summary.total,
                bold(&args.output_dir.display().to_string()),
            );
        }
    }
    Ok(summary.exit_code().clamp(0, 255) as u8)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    args: &RenderArgs,
    progress: Option<ProgressCallback>,
    cancel: CancelFlag,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(args.dpi)
        .format(args.format)
        .quality(args.quality)
        .spacing(args.spacing)
        .width_policy(if args.fixed_width {
            WidthPolicy::FixedWidth
        } else {
            WidthPolicy::AutoWidth
        })
        .auto_crop(!args.no_crop)
        .crop_margin(args.crop_margin)
        .cancel_flag(cancel);

    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Ask on stderr/stdin before replacing an existing file. Anything but
/// `y`/`yes` (including EOF) means no.
fn prompt_overwrite(path: &Path) -> bool {
    eprint!("File {} already exists. Overwrite? [y/N] ", path.display());
    let _ = io::stderr().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
