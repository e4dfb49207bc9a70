//! Configuration types for PDF-to-long-screenshot conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is handed to the pipeline
//! when it is constructed and never read from anywhere else, so two
//! conversions with different settings can run side by side.

use crate::error::Pdf2LongError;
use crate::pipeline::bounds::DEFAULT_WHITE_THRESHOLD;
use crate::pipeline::driver::CancelFlag;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted rendering resolution.
pub const MIN_DPI: u32 = 72;
/// Highest accepted rendering resolution.
pub const MAX_DPI: u32 = 300;

/// Configuration for a single PDF-to-image conversion.
///
/// # Example
/// ```rust
/// use pdf2long::{ConversionConfig, WidthPolicy};
///
/// let config = ConversionConfig::builder()
///     .dpi(200)
///     .spacing(12)
///     .width_policy(WidthPolicy::FixedWidth)
///     .build()
///     .unwrap();
/// assert_eq!(config.layout().spacing, 12);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI. Range: 72–300. Default: 150.
    pub dpi: u32,

    /// Blank pixels inserted between consecutive pages. Default: 0.
    pub spacing: u32,

    /// How pages share the canvas width. Default: [`WidthPolicy::AutoWidth`].
    pub width_policy: WidthPolicy,

    /// Trim white borders from every page before stacking. Default: true.
    pub auto_crop: bool,

    /// Pixels of white kept around the detected content when cropping. Default: 10.
    pub crop_margin: u32,

    /// A pixel whose R, G and B all exceed this value counts as background.
    /// Default: 250.
    pub white_threshold: u8,

    /// Encoding used when writing the result to disk. Default: PNG.
    pub format: OutputFormat,

    /// JPEG quality, 1–100. Ignored for PNG. Default: 85.
    pub quality: u8,

    /// Refuse inputs larger than this many megabytes. Default: 100.
    pub max_file_size_mb: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Receives per-page events while the pipeline runs.
    pub progress_callback: Option<ProgressCallback>,

    /// Checked between pages; when tripped the conversion stops with
    /// [`Pdf2LongError::Cancelled`].
    pub cancel: Option<CancelFlag>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            spacing: 0,
            width_policy: WidthPolicy::default(),
            auto_crop: true,
            crop_margin: 10,
            white_threshold: DEFAULT_WHITE_THRESHOLD,
            format: OutputFormat::default(),
            quality: 85,
            max_file_size_mb: 100,
            password: None,
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("spacing", &self.spacing)
            .field("width_policy", &self.width_policy)
            .field("auto_crop", &self.auto_crop)
            .field("crop_margin", &self.crop_margin)
            .field("white_threshold", &self.white_threshold)
            .field("format", &self.format)
            .field("quality", &self.quality)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The compositor's view of this config.
    pub fn layout(&self) -> LayoutPolicy {
        LayoutPolicy {
            width: self.width_policy,
            spacing: self.spacing,
            white_threshold: self.white_threshold,
        }
    }

    /// Check every range constraint.
    pub fn validate(&self) -> Result<(), Pdf2LongError> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(Pdf2LongError::InvalidConfig(format!(
                "DPI must be between {MIN_DPI} and {MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(Pdf2LongError::InvalidConfig(format!(
                "Quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if self.max_file_size_mb == 0 {
            return Err(Pdf2LongError::InvalidConfig(
                "Maximum file size must be at least 1 MB".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
///
/// Setters store values as given; range checks happen in [`build`](Self::build)
/// so a bad value is reported instead of silently clamped.
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn spacing(mut self, px: u32) -> Self {
        self.config.spacing = px;
        self
    }

    pub fn width_policy(mut self, policy: WidthPolicy) -> Self {
        self.config.width_policy = policy;
        self
    }

    pub fn auto_crop(mut self, v: bool) -> Self {
        self.config.auto_crop = v;
        self
    }

    pub fn crop_margin(mut self, px: u32) -> Self {
        self.config.crop_margin = px;
        self
    }

    pub fn white_threshold(mut self, t: u8) -> Self {
        self.config.white_threshold = t;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q;
        self
    }

    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.max_file_size_mb = mb;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.config.cancel = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2LongError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How pages of different widths share the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WidthPolicy {
    /// Pages keep their own width, flush left; the canvas is then trimmed to
    /// the rightmost content column. (default)
    #[default]
    AutoWidth,
    /// Every page is centred on a canvas as wide as the widest page.
    FixedWidth,
}

/// Parameters the canvas compositor needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPolicy {
    pub width: WidthPolicy,
    /// Pixels between consecutive pages.
    pub spacing: u32,
    /// Channel value above which a pixel counts as background when
    /// trimming an AutoWidth canvas.
    pub white_threshold: u8,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            width: WidthPolicy::default(),
            spacing: 0,
            white_threshold: DEFAULT_WHITE_THRESHOLD,
        }
    }
}

/// Image encoding for the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless. (default)
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = Pdf2LongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            other => Err(Pdf2LongError::InvalidConfig(format!(
                "Format must be 'png' or 'jpeg', got '{other}'"
            ))),
        }
    }
}
