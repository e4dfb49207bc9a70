//! Output types returned by the conversion API.

use image::RgbImage;
use serde::Serialize;
use std::path::PathBuf;

/// The finished long image together with what it took to make it.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The composed canvas, top page first.
    pub image: RgbImage,
    pub stats: ConversionStats,
    /// Document metadata, when the rasteriser is pdfium.
    pub info: Option<DocumentInfo>,
}

/// Statistics about a completed conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Pages rasterised from the document.
    pub page_count: usize,
    /// Width of the final canvas in pixels.
    pub width: u32,
    /// Height of the final canvas in pixels.
    pub height: u32,
    pub render_duration_ms: u64,
    pub normalize_duration_ms: u64,
    pub compose_duration_ms: u64,
    /// Wall-clock time including validation and encoding, where applicable.
    pub total_duration_ms: u64,
}

/// Metadata read from a PDF without rendering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub page_count: usize,
    pub pdf_version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
}
