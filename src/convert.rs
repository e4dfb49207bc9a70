//! Conversion entry points.
//!
//! Every function here validates the config and the input path first, then
//! runs the blocking [`Pipeline`] on tokio's blocking pool. The pipeline
//! holds the whole document in memory; use [`crate::batch`] to convert many
//! documents with a bounded number in flight.

use crate::config::ConversionConfig;
use crate::error::Pdf2LongError;
use crate::output::{ConversionOutput, ConversionStats, DocumentInfo};
use crate::pipeline::driver::Pipeline;
use crate::pipeline::encode::{self, AlwaysOverwrite, ConfirmOverwrite};
use crate::pipeline::input;
use crate::pipeline::render::{self, PdfiumRasterizer, Rasterizer};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Convert a PDF file into one long image.
///
/// # Example
/// ```rust,no_run
/// use pdf2long::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = convert("slides.pdf", &ConversionConfig::default()).await?;
/// println!("{} pages → {}x{}", output.stats.page_count, output.stats.width, output.stats.height);
/// output.image.save("slides.png")?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// - Validation errors for a bad config or input path
/// - Rendering errors when pdfium cannot open or rasterise the document
/// - [`Pdf2LongError::Composition`] for a document with no pages
/// - [`Pdf2LongError::Cancelled`] when the config's cancel flag trips
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2LongError> {
    let total_start = Instant::now();
    config.validate()?;
    let pdf_path = input::validate_pdf_path(input.as_ref(), config.max_file_size_mb)?;
    info!("Starting conversion: {}", pdf_path.display());

    let info = render::extract_info(&pdf_path, config.password.as_deref()).await?;
    info!("PDF has {} pages", info.page_count);

    let rasterizer = PdfiumRasterizer::new(config.password.clone());
    let mut output = run_pipeline(rasterizer, pdf_path, config).await?;
    output.info = Some(info);
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Like [`convert`], but with a caller-supplied [`Rasterizer`].
///
/// No document metadata is read, so `output.info` is `None`.
pub async fn convert_with<R>(
    rasterizer: R,
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2LongError>
where
    R: Rasterizer + Send + 'static,
{
    let total_start = Instant::now();
    config.validate()?;
    let pdf_path = input::validate_pdf_path(input.as_ref(), config.max_file_size_mb)?;
    let mut output = run_pipeline(rasterizer, pdf_path, config).await?;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Convert a PDF and write the image to `output_path` in `config.format`.
///
/// When `output_path` already exists `confirm` is asked before any work is
/// done; if it declines, nothing is converted and `Ok(None)` is returned.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
    confirm: &(dyn ConfirmOverwrite + Sync),
) -> Result<Option<ConversionStats>, Pdf2LongError> {
    let output_path = output_path.as_ref();
    if output_path.exists() && !confirm.confirm(output_path) {
        info!("Skipping conversion, not overwriting {}", output_path.display());
        return Ok(None);
    }

    let started = Instant::now();
    let output = convert(input, config).await?;
    write_output(output, output_path.to_path_buf(), config, started)
        .await
        .map(Some)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2LongError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2LongError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Read PDF metadata without rendering any page.
pub async fn inspect(input: impl AsRef<Path>) -> Result<DocumentInfo, Pdf2LongError> {
    let limit = ConversionConfig::default().max_file_size_mb;
    let pdf_path = input::validate_pdf_path(input.as_ref(), limit)?;
    render::extract_info(&pdf_path, None).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run the pipeline for one document on the blocking pool.
pub(crate) async fn run_pipeline<R>(
    rasterizer: R,
    pdf_path: PathBuf,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2LongError>
where
    R: Rasterizer + Send + 'static,
{
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let mut pipeline = Pipeline::new(rasterizer, config);
        let image = pipeline.run(&pdf_path)?;
        let timings = pipeline.timings();
        let stats = ConversionStats {
            page_count: pipeline.page_count(),
            width: image.width(),
            height: image.height(),
            render_duration_ms: timings.render_ms,
            normalize_duration_ms: timings.normalize_ms,
            compose_duration_ms: timings.compose_ms,
            total_duration_ms: 0,
        };
        Ok(ConversionOutput {
            image,
            stats,
            info: None,
        })
    })
    .await
    .map_err(|e| Pdf2LongError::Internal(format!("Pipeline task panicked: {}", e)))?
}

/// Encode and write a finished conversion, overwriting any existing file.
pub(crate) async fn write_output(
    output: ConversionOutput,
    path: PathBuf,
    config: &ConversionConfig,
    started: Instant,
) -> Result<ConversionStats, Pdf2LongError> {
    let (format, quality) = (config.format, config.quality);
    let ConversionOutput {
        image, mut stats, ..
    } = output;

    tokio::task::spawn_blocking(move || {
        encode::write_image(&image, &path, format, quality, &AlwaysOverwrite)
    })
    .await
    .map_err(|e| Pdf2LongError::Internal(format!("Writer task panicked: {}", e)))??;

    stats.total_duration_ms = started.elapsed().as_millis() as u64;
    Ok(stats)
}
