//! PDF rasterisation: turn each page into a `DynamicImage`.
//!
//! The pipeline only sees the [`Rasterizer`] trait, so tests (and callers
//! with their own renderer) can feed it in-memory pages. [`PdfiumRasterizer`]
//! is the production implementation.
//!
//! ## Threading
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks for the whole render. The async entry points in
//! [`crate::convert`] run the pipeline inside `tokio::task::spawn_blocking`
//! so Tokio worker threads never stall during rasterisation.

use crate::error::Pdf2LongError;
use crate::output::DocumentInfo;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// PDF user space is 72 units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Source of raw page bitmaps.
///
/// Implementations return every page of the document in document order.
/// `on_page(page_num, total_pages)` (1-indexed) may be called after each page
/// is rendered. Any failure is reported as a Rendering-kind error.
pub trait Rasterizer {
    fn render(
        &self,
        pdf_path: &Path,
        dpi: u32,
        on_page: Option<&dyn Fn(usize, usize)>,
    ) -> Result<Vec<DynamicImage>, Pdf2LongError>;
}

/// Renders pages with pdfium, binding the library through `pdfium-auto`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    password: Option<String>,
}

impl PdfiumRasterizer {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn render(
        &self,
        pdf_path: &Path,
        dpi: u32,
        on_page: Option<&dyn Fn(usize, usize)>,
    ) -> Result<Vec<DynamicImage>, Pdf2LongError> {
        let pdfium = bind()?;
        let document = open(&pdfium, pdf_path, self.password.as_deref())?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages, rendering at {} DPI", total_pages, dpi);

        let render_config =
            PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

        let mut images = Vec::with_capacity(total_pages);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                Pdf2LongError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);

            if let Some(cb) = on_page {
                cb(idx + 1, total_pages);
            }
        }

        Ok(images)
    }
}

fn bind() -> Result<Pdfium, Pdf2LongError> {
    pdfium_auto::bind_pdfium(None).map_err(|e| Pdf2LongError::PdfiumBindingFailed(e.to_string()))
}

fn open<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2LongError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.to_ascii_lowercase().contains("password") {
            if password.is_some() {
                Pdf2LongError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2LongError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2LongError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Read page count and document metadata without rendering.
pub async fn extract_info(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2LongError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_info_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2LongError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_info_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2LongError> {
    let pdfium = bind()?;
    let document = open(&pdfium, pdf_path, password)?;
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(DocumentInfo {
        path: pdf_path.to_path_buf(),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
    })
}
