//! Input validation: make sure a path names a readable, reasonably sized PDF
//! before pdfium is asked to open it.
//!
//! pdfium reports a wrong file type as a generic load failure, which would
//! surface as a Rendering error. Checking the name, size and `%PDF` header up
//! front turns those cases into Validation errors with a precise message.

use crate::error::Pdf2LongError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// `true` when the path ends in `.pdf` (any case).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Validate that `path` is a PDF file no larger than `max_size_mb`.
pub fn validate_pdf_path(path: &Path, max_size_mb: u64) -> Result<PathBuf, Pdf2LongError> {
    let path = path.to_path_buf();

    let meta = match std::fs::metadata(&path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2LongError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2LongError::FileNotFound { path }),
    };

    if !meta.is_file() {
        return Err(Pdf2LongError::NotAFile { path });
    }

    if !has_pdf_extension(&path) {
        return Err(Pdf2LongError::WrongExtension { path });
    }

    let size_mb = meta.len() as f64 / BYTES_PER_MB;
    if size_mb > max_size_mb as f64 {
        return Err(Pdf2LongError::FileTooLarge {
            size_mb,
            max_mb: max_size_mb,
        });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            // Files shorter than four bytes fail the header check too.
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(Pdf2LongError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2LongError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2LongError::FileNotFound { path }),
    }

    debug!("Validated input PDF: {} ({:.2} MB)", path.display(), size_mb);
    Ok(path)
}
