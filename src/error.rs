//! Error types for the pdf2long library.
//!
//! Every failure is fatal to the conversion that raised it: there is no
//! partial output and no retry. What callers do need is to tell failures
//! apart, so each variant belongs to one [`ErrorKind`] and every kind maps
//! to a distinct process exit status via [`ErrorKind::exit_code`].
//!
//! | Kind          | Raised by                                  | Exit |
//! |---------------|--------------------------------------------|------|
//! | `Validation`  | config builder, input checks               | 1    |
//! | `Rendering`   | PDFium binding, document load, page raster | 2    |
//! | `Composition` | canvas compositor                          | 3    |
//! | `Output`      | image encoding, file writing               | 4    |
//! | `Cancelled`   | cancel flag tripped between pages          | 130  |
//! | `Internal`    | task panics, misuse of a pipeline instance | 255  |

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2long library.
#[derive(Debug, Error)]
pub enum Pdf2LongError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File does not exist: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("Path is not a file: '{path}'")]
    NotAFile { path: PathBuf },

    #[error("Path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    #[error("Invalid file format: expected .pdf, got '{path}'")]
    WrongExtension { path: PathBuf },

    /// The file has a `.pdf` name but not the `%PDF` header.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    #[error("File size ({size_mb:.2} MB) exceeds maximum limit of {max_mb} MB")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    // ── Rendering errors ──────────────────────────────────────────────────
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    #[error(
        "PDF '{path}' is encrypted and requires a password.\n\
Provide it with --password <PASSWORD>."
    )]
    PasswordRequired { path: PathBuf },

    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    /// Any other rasteriser failure.
    #[error("Failed to render PDF pages: {0}")]
    Rendering(String),

    // ── Composition errors ────────────────────────────────────────────────
    #[error("Failed to compose images: {0}")]
    Composition(String),

    // ── Output errors ─────────────────────────────────────────────────────
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {format} image: {detail}")]
    EncodeFailed { format: String, detail: String },

    // ── Control ───────────────────────────────────────────────────────────
    #[error("Conversion cancelled")]
    Cancelled,

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`Pdf2LongError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    Validation,
    Rendering,
    Composition,
    Output,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Process exit status the CLI uses for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Validation => 1,
            ErrorKind::Rendering => 2,
            ErrorKind::Composition => 3,
            ErrorKind::Output => 4,
            ErrorKind::Cancelled => 130,
            ErrorKind::Internal => 255,
        }
    }
}

impl Pdf2LongError {
    pub fn kind(&self) -> ErrorKind {
        use Pdf2LongError::*;
        match self {
            InvalidConfig(_)
            | FileNotFound { .. }
            | NotAFile { .. }
            | NotADirectory { .. }
            | WrongExtension { .. }
            | NotAPdf { .. }
            | FileTooLarge { .. }
            | PermissionDenied { .. } => ErrorKind::Validation,
            CorruptPdf { .. }
            | PasswordRequired { .. }
            | WrongPassword { .. }
            | RasterisationFailed { .. }
            | PdfiumBindingFailed(_)
            | Rendering(_) => ErrorKind::Rendering,
            Composition(_) => ErrorKind::Composition,
            OutputWriteFailed { .. } | EncodeFailed { .. } => ErrorKind::Output,
            Cancelled => ErrorKind::Cancelled,
            Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_distinct_exit_codes() {
        let cases = [
            (Pdf2LongError::InvalidConfig("dpi".into()), 1),
            (Pdf2LongError::Rendering("boom".into()), 2),
            (Pdf2LongError::Composition("empty".into()), 3),
            (
                Pdf2LongError::EncodeFailed {
                    format: "PNG".into(),
                    detail: "x".into(),
                },
                4,
            ),
            (Pdf2LongError::Cancelled, 130),
            (Pdf2LongError::Internal("panic".into()), 255),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }

    #[test]
    fn rasterisation_failure_is_rendering_kind() {
        let e = Pdf2LongError::RasterisationFailed {
            page: 4,
            detail: "bad xobject".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Rendering);
        assert!(e.to_string().contains("page 4"));
        assert!(e.to_string().contains("bad xobject"));
    }

    #[test]
    fn composition_message_embeds_cause() {
        let e = Pdf2LongError::Composition("Cannot compose empty page list".into());
        assert_eq!(
            e.to_string(),
            "Failed to compose images: Cannot compose empty page list"
        );
    }

    #[test]
    fn file_too_large_display() {
        let e = Pdf2LongError::FileTooLarge {
            size_mb: 120.5,
            max_mb: 100,
        };
        assert!(e.to_string().contains("120.50 MB"), "got: {e}");
        assert_eq!(e.kind(), ErrorKind::Validation);
    }
}
