//! # pdf2long
//!
//! Render every page of a PDF and stack the pages into one long vertical
//! image, the way a scrolling screenshot of the document would look.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      check the path names a readable PDF
//!  ├─ 2. Render     rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Normalize  flatten to opaque RGB, crop white borders + margin
//!  ├─ 4. Compose    stack pages onto one canvas (AutoWidth / FixedWidth)
//!  └─ 5. Encode     PNG or JPEG, written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2long::{convert_to_file, AlwaysOverwrite, ConversionConfig, WidthPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .dpi(200)
//!         .spacing(16)
//!         .width_policy(WidthPolicy::FixedWidth)
//!         .build()?;
//!     let stats = convert_to_file("report.pdf", "report.png", &config, &AlwaysOverwrite).await?;
//!     if let Some(stats) = stats {
//!         eprintln!("{} pages → {}x{}", stats.page_count, stats.width, stats.height);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2long` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2long = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_dir, convert_dir_with, BatchOptions, BatchSummary};
pub use config::{
    ConversionConfig, ConversionConfigBuilder, LayoutPolicy, OutputFormat, WidthPolicy, MAX_DPI,
    MIN_DPI,
};
pub use convert::{convert, convert_sync, convert_to_file, convert_with, inspect};
pub use error::{ErrorKind, Pdf2LongError};
pub use output::{ConversionOutput, ConversionStats, DocumentInfo};
pub use pipeline::compose::compose;
pub use pipeline::driver::{CancelFlag, Pipeline, PipelineState};
pub use pipeline::encode::{
    default_output_path, AlwaysOverwrite, ConfirmOverwrite, NeverOverwrite, WriteOutcome,
};
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use progress::{
    BatchProgressCallback, ConversionProgressCallback, NoopProgressCallback, ProgressCallback,
};
