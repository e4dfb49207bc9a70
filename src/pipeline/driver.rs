//! The pipeline driver: rasterise → normalise → compose, once per document.
//!
//! ```text
//! Idle ──▶ Rendering ──▶ Normalizing ──▶ Composing ──▶ Done
//!              │              │              │
//!              └──────────────┴──────────────┴──────▶ Failed
//! ```
//!
//! A [`Pipeline`] is single-shot: its state only moves forward, and calling
//! [`Pipeline::run`] a second time is an error. Build a fresh one for every
//! document.

use super::compose::compose;
use super::normalize::normalize;
use super::render::Rasterizer;
use crate::config::ConversionConfig;
use crate::error::Pdf2LongError;
use image::RgbImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Cooperative cancellation shared between a caller and a running pipeline.
///
/// The pipeline checks it before normalising each page and once more before
/// composing; rasterisation itself is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a [`Pipeline`] is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PipelineState {
    Idle,
    Rendering,
    Normalizing,
    Composing,
    Done,
    Failed,
}

/// Wall-clock time spent in each stage of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub render_ms: u64,
    pub normalize_ms: u64,
    pub compose_ms: u64,
}

/// Drives one conversion from a PDF path to the composed canvas.
pub struct Pipeline<R> {
    rasterizer: R,
    config: ConversionConfig,
    state: PipelineState,
    timings: StageTimings,
    page_count: usize,
}

impl<R: Rasterizer> Pipeline<R> {
    pub fn new(rasterizer: R, config: ConversionConfig) -> Self {
        Self {
            rasterizer,
            config,
            state: PipelineState::Idle,
            timings: StageTimings::default(),
            page_count: 0,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn timings(&self) -> StageTimings {
        self.timings
    }

    /// Number of pages rasterised, once rendering has finished.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Run every stage and return the finished canvas.
    ///
    /// On any error the pipeline moves to [`PipelineState::Failed`] and no
    /// image is returned.
    pub fn run(&mut self, pdf_path: &Path) -> Result<RgbImage, Pdf2LongError> {
        if self.state != PipelineState::Idle {
            return Err(Pdf2LongError::Internal(format!(
                "pipeline already used (state {:?}); create a new one per document",
                self.state
            )));
        }

        match self.run_stages(pdf_path) {
            Ok(canvas) => {
                self.state = PipelineState::Done;
                Ok(canvas)
            }
            Err(e) => {
                debug!("Pipeline failed in {:?}: {}", self.state, e);
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, pdf_path: &Path) -> Result<RgbImage, Pdf2LongError> {
        let progress = self.config.progress_callback.clone();

        // ── Rendering ────────────────────────────────────────────────────
        self.state = PipelineState::Rendering;
        let started = Instant::now();
        let on_rendered = progress
            .as_ref()
            .map(|cb| move |page: usize, total: usize| cb.on_page_rendered(page, total));
        let raw = self.rasterizer.render(
            pdf_path,
            self.config.dpi,
            on_rendered.as_ref().map(|f| f as &dyn Fn(usize, usize)),
        )?;
        self.timings.render_ms = started.elapsed().as_millis() as u64;
        self.page_count = raw.len();
        if let Some(idx) = raw.iter().position(|p| p.width() == 0 || p.height() == 0) {
            return Err(Pdf2LongError::Rendering(format!(
                "page {} rendered as an empty {}x{} bitmap",
                idx + 1,
                raw[idx].width(),
                raw[idx].height()
            )));
        }
        info!(
            "Rendered {} pages in {}ms",
            self.page_count, self.timings.render_ms
        );

        // ── Normalizing ──────────────────────────────────────────────────
        self.state = PipelineState::Normalizing;
        let total = raw.len();
        if let Some(ref cb) = progress {
            cb.on_conversion_start(total);
        }
        let started = Instant::now();
        let mut pages = Vec::with_capacity(total);
        for (idx, img) in raw.into_iter().enumerate() {
            self.check_cancelled()?;
            let page = normalize(
                img,
                self.config.auto_crop,
                self.config.crop_margin,
                self.config.white_threshold,
            );
            debug!("Page {} normalised to {}x{}", idx + 1, page.width(), page.height());
            pages.push(page);
            if let Some(ref cb) = progress {
                cb.on_page_normalized(idx + 1, total);
            }
        }
        self.timings.normalize_ms = started.elapsed().as_millis() as u64;
        self.check_cancelled()?;

        // ── Composing ────────────────────────────────────────────────────
        self.state = PipelineState::Composing;
        if let Some(ref cb) = progress {
            cb.on_composing(total);
        }
        let started = Instant::now();
        let canvas = compose(&pages, self.config.layout())?;
        self.timings.compose_ms = started.elapsed().as_millis() as u64;
        info!(
            "Composed {} pages into {}x{} in {}ms",
            total,
            canvas.width(),
            canvas.height(),
            self.timings.compose_ms
        );

        if let Some(ref cb) = progress {
            cb.on_conversion_complete(canvas.width(), canvas.height());
        }
        Ok(canvas)
    }

    fn check_cancelled(&self) -> Result<(), Pdf2LongError> {
        match self.config.cancel {
            Some(ref flag) if flag.is_cancelled() => Err(Pdf2LongError::Cancelled),
            _ => Ok(()),
        }
    }
}
