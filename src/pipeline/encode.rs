//! Image encoding and output writing.
//!
//! PNG is written with the best compression level: the output is often a
//! very tall image of mostly white text pages, which compresses extremely
//! well and is lossless. JPEG is offered for photos-heavy documents where
//! file size matters more than crisp text.
//!
//! Whether an existing file may be replaced is decided by an injected
//! [`ConfirmOverwrite`] so the writer never touches the terminal itself.

use crate::config::OutputFormat;
use crate::error::Pdf2LongError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decides whether an existing output file may be replaced.
pub trait ConfirmOverwrite {
    fn confirm(&self, path: &Path) -> bool;
}

/// Replace existing files without asking.
pub struct AlwaysOverwrite;

impl ConfirmOverwrite for AlwaysOverwrite {
    fn confirm(&self, _path: &Path) -> bool {
        true
    }
}

/// Never replace an existing file.
pub struct NeverOverwrite;

impl ConfirmOverwrite for NeverOverwrite {
    fn confirm(&self, _path: &Path) -> bool {
        false
    }
}

impl<F> ConfirmOverwrite for F
where
    F: Fn(&Path) -> bool,
{
    fn confirm(&self, path: &Path) -> bool {
        self(path)
    }
}

/// What [`write_image`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file existed and the confirmer said no; nothing was written.
    Declined,
}

/// Encode `img` in memory.
///
/// `quality` (1–100) only applies to JPEG.
pub fn encode_image(
    img: &RgbImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, Pdf2LongError> {
    let mut buf = Vec::new();
    let (w, h) = img.dimensions();

    let result = match format {
        OutputFormat::Png => {
            PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive)
                .write_image(img.as_raw(), w, h, ExtendedColorType::Rgb8)
        }
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .write_image(img.as_raw(), w, h, ExtendedColorType::Rgb8),
    };
    result.map_err(|e| Pdf2LongError::EncodeFailed {
        format: format.to_string(),
        detail: e.to_string(),
    })?;

    debug!("Encoded {}x{} image → {} bytes {}", w, h, buf.len(), format);
    Ok(buf)
}

/// Encode and write `img` to `path`.
///
/// Parent directories are created as needed. The bytes go to a temporary
/// file next to `path` which is then renamed over it, so a failed write
/// never leaves a truncated image behind.
pub fn write_image(
    img: &RgbImage,
    path: &Path,
    format: OutputFormat,
    quality: u8,
    confirm: &dyn ConfirmOverwrite,
) -> Result<WriteOutcome, Pdf2LongError> {
    if path.exists() && !confirm.confirm(path) {
        info!("Not overwriting existing file {}", path.display());
        return Ok(WriteOutcome::Declined);
    }

    let bytes = encode_image(img, format, quality)?;
    let write_err = |source: std::io::Error| Pdf2LongError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(WriteOutcome::Written)
}

/// `<dir>/<stem>_long_screenshot.<ext>` next to the input PDF.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_long_screenshot.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::cell::Cell;

    fn sample() -> RgbImage {
        RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 128]))
    }

    #[test]
    fn png_is_lossless() {
        let img = sample();
        let bytes = encode_image(&img, OutputFormat::Png, 85).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn jpeg_has_soi_marker_and_size() {
        let bytes = encode_image(&sample(), OutputFormat::Jpeg, 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn writes_into_new_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/deeper/out.png");
        let outcome =
            write_image(&sample(), &out, OutputFormat::Png, 85, &AlwaysOverwrite).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert!(out.exists());
    }

    #[test]
    fn declined_overwrite_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("keep.png");
        std::fs::write(&out, b"original").unwrap();

        let asked = Cell::new(0);
        let confirm = |_: &Path| {
            asked.set(asked.get() + 1);
            false
        };
        let outcome = write_image(&sample(), &out, OutputFormat::Png, 85, &confirm).unwrap();
        assert_eq!(outcome, WriteOutcome::Declined);
        assert_eq!(asked.get(), 1);
        assert_eq!(std::fs::read(&out).unwrap(), b"original");
    }

    #[test]
    fn confirmer_not_consulted_for_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fresh.jpg");
        let outcome =
            write_image(&sample(), &out, OutputFormat::Jpeg, 70, &NeverOverwrite).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
    }

    #[test]
    fn accepted_overwrite_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("replace.png");
        std::fs::write(&out, b"stale").unwrap();
        write_image(&sample(), &out, OutputFormat::Png, 85, &AlwaysOverwrite).unwrap();
        assert_ne!(std::fs::read(&out).unwrap(), b"stale");
    }

    #[test]
    fn default_output_path_uses_suffix_and_extension() {
        assert_eq!(
            default_output_path(Path::new("/docs/report.pdf"), OutputFormat::Png),
            PathBuf::from("/docs/report_long_screenshot.png")
        );
        assert_eq!(
            default_output_path(Path::new("slides.pdf"), OutputFormat::Jpeg),
            PathBuf::from("slides_long_screenshot.jpg")
        );
    }
}
