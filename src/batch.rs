//! Directory batch conversion.
//!
//! Finds every PDF under an input directory and writes one long image per
//! document into an output directory that mirrors the input layout:
//!
//! ```text
//! in/a.pdf            ──▶ out/a_long_screenshot.png
//! in/reports/q1.pdf   ──▶ out/reports/q1_long_screenshot.png
//! ```
//!
//! Batch mode never prompts. Existing outputs are overwritten unless
//! [`BatchOptions::skip_existing`] is set, and one failing document never
//! stops the others.

use crate::config::{ConversionConfig, OutputFormat};
use crate::convert::{convert_with, write_output};
use crate::error::Pdf2LongError;
use crate::pipeline::input::has_pdf_extension;
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::progress::BatchProgressCallback;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How [`convert_dir`] walks and schedules the input directory.
#[derive(Clone)]
pub struct BatchOptions {
    /// Descend into subdirectories. Default: true.
    pub recursive: bool,
    /// Leave documents whose output file already exists alone. Default: false.
    pub skip_existing: bool,
    /// Documents converted at the same time. Default: 1.
    pub jobs: usize,
    pub progress: Option<Arc<dyn BatchProgressCallback>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            skip_existing: false,
            jobs: 1,
            progress: None,
        }
    }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Converted { width: u32, height: u32 },
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Per-file results of a batch, in sorted input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl BatchSummary {
    fn from_items(items: Vec<BatchItem>) -> Self {
        let count = |f: fn(&BatchOutcome) -> bool| items.iter().filter(|i| f(&i.outcome)).count();
        Self {
            total: items.len(),
            converted: count(|o| matches!(o, BatchOutcome::Converted { .. })),
            skipped: count(|o| matches!(o, BatchOutcome::Skipped)),
            failed: count(|o| matches!(o, BatchOutcome::Failed { .. })),
            items,
        }
    }

    /// 2 when any document failed, 1 when none was converted, else 0.
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            2
        } else if self.converted == 0 {
            1
        } else {
            0
        }
    }
}

/// List the `.pdf` files under `dir`, sorted by path.
pub fn find_pdf_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, Pdf2LongError> {
    check_dir(dir)?;
    let mut found = Vec::new();
    collect_pdfs(dir, recursive, &mut found)?;
    found.sort();
    debug!("Found {} PDF files under {}", found.len(), dir.display());
    Ok(found)
}

fn check_dir(dir: &Path) -> Result<(), Pdf2LongError> {
    match std::fs::metadata(dir) {
        Ok(m) if m.is_dir() => Ok(()),
        Ok(_) => Err(Pdf2LongError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(Pdf2LongError::PermissionDenied {
                path: dir.to_path_buf(),
            })
        }
        Err(_) => Err(Pdf2LongError::FileNotFound {
            path: dir.to_path_buf(),
        }),
    }
}

fn collect_pdfs(
    dir: &Path,
    recursive: bool,
    found: &mut Vec<PathBuf>,
) -> Result<(), Pdf2LongError> {
    let entries = std::fs::read_dir(dir).map_err(|_| Pdf2LongError::PermissionDenied {
        path: dir.to_path_buf(),
    })?;

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else { continue };
        if file_type.is_dir() {
            if recursive {
                if let Err(e) = collect_pdfs(&path, true, found) {
                    warn!("Skipping unreadable directory {}: {}", path.display(), e);
                }
            }
        } else if has_pdf_extension(&path) {
            found.push(path);
        }
    }
    Ok(())
}

/// Where the image for `pdf` goes: its path relative to `input_dir`,
/// re-rooted at `output_dir`, renamed `<stem>_long_screenshot.<ext>`.
pub fn batch_output_path(
    pdf: &Path,
    input_dir: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> PathBuf {
    let relative = pdf.strip_prefix(input_dir).unwrap_or(pdf);
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = format!("{stem}_long_screenshot.{}", format.extension());

    match relative.parent() {
        Some(sub) if pdf.starts_with(input_dir) => output_dir.join(sub).join(file_name),
        _ => output_dir.join(file_name),
    }
}

/// Convert every PDF under `input_dir` with pdfium.
///
/// Fails only when `input_dir` cannot be listed or the config's cancel flag
/// trips; per-document failures are recorded in the summary.
pub async fn convert_dir(
    input_dir: &Path,
    output_dir: &Path,
    options: &BatchOptions,
    config: &ConversionConfig,
) -> Result<BatchSummary, Pdf2LongError> {
    let password = config.password.clone();
    convert_dir_with(input_dir, output_dir, options, config, move || {
        PdfiumRasterizer::new(password.clone())
    })
    .await
}

/// Like [`convert_dir`], building one rasteriser per document with
/// `make_rasterizer`.
pub async fn convert_dir_with<R, F>(
    input_dir: &Path,
    output_dir: &Path,
    options: &BatchOptions,
    config: &ConversionConfig,
    make_rasterizer: F,
) -> Result<BatchSummary, Pdf2LongError>
where
    R: Rasterizer + Send + 'static,
    F: Fn() -> R,
{
    config.validate()?;
    let files = find_pdf_files(input_dir, options.recursive)?;
    let total = files.len();
    info!(
        "Batch: {} PDF files in {}, {} at a time",
        total,
        input_dir.display(),
        options.jobs.max(1)
    );
    if let Some(ref cb) = options.progress {
        cb.on_batch_start(total);
    }

    let jobs = files.into_iter().enumerate().map(|(idx, pdf)| {
        let output = batch_output_path(&pdf, input_dir, output_dir, config.format);
        let rasterizer = make_rasterizer();
        async move {
            let outcome =
                convert_one(rasterizer, &pdf, &output, options.skip_existing, config).await;
            (idx, BatchItem { input: pdf, output, outcome })
        }
    });

    let mut in_flight = stream::iter(jobs).buffer_unordered(options.jobs.max(1));
    let mut done = Vec::with_capacity(total);
    while let Some((idx, item)) = in_flight.next().await {
        match &item.outcome {
            BatchOutcome::Converted { width, height } => {
                info!("Converted {} ({}x{})", item.input.display(), width, height)
            }
            BatchOutcome::Skipped => info!("Skipped {} (output exists)", item.input.display()),
            BatchOutcome::Failed { error } => warn!("Failed {}: {}", item.input.display(), error),
        }
        if let Some(ref cb) = options.progress {
            cb.on_file_complete(done.len() + 1, total, &item);
        }
        done.push((idx, item));
    }

    if config.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
        return Err(Pdf2LongError::Cancelled);
    }

    done.sort_by_key(|(idx, _)| *idx);
    let summary = BatchSummary::from_items(done.into_iter().map(|(_, item)| item).collect());
    info!(
        "Batch complete: {} converted, {} skipped, {} failed",
        summary.converted, summary.skipped, summary.failed
    );
    Ok(summary)
}

async fn convert_one<R>(
    rasterizer: R,
    pdf: &Path,
    output: &Path,
    skip_existing: bool,
    config: &ConversionConfig,
) -> BatchOutcome
where
    R: Rasterizer + Send + 'static,
{
    if skip_existing && output.exists() {
        return BatchOutcome::Skipped;
    }
    if config.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
        return BatchOutcome::Failed {
            error: Pdf2LongError::Cancelled.to_string(),
        };
    }

    let started = Instant::now();
    let result = match convert_with(rasterizer, pdf, config).await {
        Ok(converted) => write_output(converted, output.to_path_buf(), config, started).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(stats) => BatchOutcome::Converted {
            width: stats.width,
            height: stats.height,
        },
        Err(e) => BatchOutcome::Failed {
            error: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"%PDF-1.4\n").unwrap();
    }

    #[test]
    fn finds_pdfs_sorted_and_optionally_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.pdf"));
        touch(&root.join("a.PDF"));
        touch(&root.join("sub/c.pdf"));
        std::fs::write(root.join("notes.txt"), b"x").unwrap();

        let flat = find_pdf_files(root, false).unwrap();
        assert_eq!(flat, vec![root.join("a.PDF"), root.join("b.pdf")]);

        let deep = find_pdf_files(root, true).unwrap();
        assert_eq!(deep.len(), 3);
        assert_eq!(deep[2], root.join("sub/c.pdf"));
    }

    #[test]
    fn missing_dir_and_file_are_validation_errors() {
        let err = find_pdf_files(Path::new("/no/such/dir"), true).unwrap_err();
        assert!(matches!(err, Pdf2LongError::FileNotFound { .. }));

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.pdf");
        touch(&file);
        let err = find_pdf_files(&file, true).unwrap_err();
        assert!(matches!(err, Pdf2LongError::NotADirectory { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn output_path_mirrors_layout() {
        let out = batch_output_path(
            Path::new("/in/reports/2024/q1.pdf"),
            Path::new("/in"),
            Path::new("/out"),
            OutputFormat::Jpeg,
        );
        assert_eq!(out, PathBuf::from("/out/reports/2024/q1_long_screenshot.jpg"));

        let top = batch_output_path(
            Path::new("/in/a.pdf"),
            Path::new("/in"),
            Path::new("/out"),
            OutputFormat::Png,
        );
        assert_eq!(top, PathBuf::from("/out/a_long_screenshot.png"));
    }

    #[test]
    fn exit_code_rules() {
        let item = |outcome| BatchItem {
            input: "a.pdf".into(),
            output: "a.png".into(),
            outcome,
        };
        let ok = BatchOutcome::Converted { width: 1, height: 1 };
        let bad = BatchOutcome::Failed { error: "x".into() };

        assert_eq!(BatchSummary::from_items(vec![]).exit_code(), 1);
        assert_eq!(BatchSummary::from_items(vec![item(BatchOutcome::Skipped)]).exit_code(), 1);
        assert_eq!(BatchSummary::from_items(vec![item(ok.clone())]).exit_code(), 0);
        assert_eq!(BatchSummary::from_items(vec![item(ok), item(bad)]).exit_code(), 2);
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let item = BatchItem {
            input: "in/a.pdf".into(),
            output: "out/a.png".into(),
            outcome: BatchOutcome::Converted { width: 10, height: 20 },
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "converted");
        assert_eq!(json["height"], 20);
    }
}
