//! # pdfium-auto
//!
//! Locate the [PDFium](https://pdfium.googlesource.com/pdfium/) shared library
//! for `pdfium-render`, downloading and caching a prebuilt copy on first use.
//!
//! Resolution order used by [`ensure_pdfium_library`]:
//!
//! 1. `PDFIUM_LIB_PATH`: an explicit library path (used when the file exists).
//! 2. The per-version cache directory (see [`LibraryCache::default_location`]).
//! 3. Download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extracting only the library file into the cache.
//!
//! ```rust,no_run
//! use pdfium_auto::bind_pdfium;
//!
//! let pdfium = bind_pdfium(Some(&|done, total| {
//!     if let Some(t) = total {
//!         eprint!("\rPDFium: {done}/{t} bytes");
//!     }
//! }))
//! .expect("PDFium unavailable");
//! # drop(pdfium);
//! ```
//!
//! ## Environment variables
//!
//! - `PDFIUM_LIB_PATH`: use this library instead of the cache.
//! - `PDFIUM_AUTO_CACHE_DIR`: root directory for the cache.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// pdfium-binaries release tag (`chromium/<tag>`) fetched by this crate.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Callback receiving `(bytes_downloaded, total_bytes)` during a download.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("No prebuilt PDFium for {os}/{arch}; set PDFIUM_LIB_PATH to a local copy")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of '{url}' failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Could not extract '{member}' from archive: {reason}")]
    Extract { member: String, reason: String },

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform table ───────────────────────────────────────────────────────────

/// Where the library lives inside a release archive for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Release asset name, e.g. `pdfium-linux-x64.tgz`.
    pub archive: &'static str,
    /// Path of the library inside the archive.
    pub member: &'static str,
    /// File name written to the cache.
    pub file_name: &'static str,
}

//  (os, arch, archive, member)
const PLATFORMS: &[(&str, &str, &str, &str)] = &[
    ("macos", "aarch64", "pdfium-mac-arm64.tgz", "lib/libpdfium.dylib"),
    ("macos", "x86_64", "pdfium-mac-x64.tgz", "lib/libpdfium.dylib"),
    ("linux", "x86_64", "pdfium-linux-x64.tgz", "lib/libpdfium.so"),
    ("linux", "aarch64", "pdfium-linux-arm64.tgz", "lib/libpdfium.so"),
    ("windows", "x86_64", "pdfium-win-x64.tgz", "bin/pdfium.dll"),
    ("windows", "aarch64", "pdfium-win-arm64.tgz", "bin/pdfium.dll"),
    ("windows", "x86", "pdfium-win-x86.tgz", "bin/pdfium.dll"),
];

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Result<Self, PdfiumAutoError> {
        let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
        Self::lookup(os, arch).ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
    }

    pub fn lookup(os: &str, arch: &str) -> Option<Self> {
        PLATFORMS
            .iter()
            .find(|(o, a, _, _)| *o == os && *a == arch)
            .map(|&(_, _, archive, member)| Platform {
                archive,
                member,
                file_name: member.rsplit('/').next().unwrap_or(member),
            })
    }

    fn download_url(&self) -> String {
        format!("{RELEASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", self.archive)
    }
}

// ── Cache ────────────────────────────────────────────────────────────────────

/// A directory holding one downloaded PDFium library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCache {
    dir: PathBuf,
}

impl LibraryCache {
    /// `$PDFIUM_AUTO_CACHE_DIR/pdfium-{VERSION}` when set, otherwise
    /// `<user cache dir>/pdf2long/pdfium-{VERSION}`.
    pub fn default_location() -> Self {
        let versioned = format!("pdfium-{PDFIUM_VERSION}");
        let dir = match std::env::var_os("PDFIUM_AUTO_CACHE_DIR") {
            Some(root) => PathBuf::from(root).join(versioned),
            None => dirs::cache_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
                .unwrap_or_else(std::env::temp_dir)
                .join("pdf2long")
                .join(versioned),
        };
        Self { dir }
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn library_path(&self, platform: &Platform) -> PathBuf {
        self.dir.join(platform.file_name)
    }

    /// An already available library, without touching the network.
    pub fn find(&self) -> Option<PathBuf> {
        if let Some(p) = env_library_path() {
            return Some(p);
        }
        let platform = Platform::current().ok()?;
        let path = self.library_path(&platform);
        path.exists().then_some(path)
    }

    /// Return the library path, downloading it into the cache if missing.
    pub fn ensure(
        &self,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<PathBuf, PdfiumAutoError> {
        if let Some(p) = self.find() {
            return Ok(p);
        }

        let platform = Platform::current()?;
        std::fs::create_dir_all(&self.dir).map_err(|source| PdfiumAutoError::CacheDir {
            path: self.dir.clone(),
            source,
        })?;

        let archive = download(&platform.download_url(), on_progress)?;
        let dest = self.library_path(&platform);
        unpack_member(&archive, platform.member, &dest)?;
        Ok(dest)
    }
}

fn env_library_path() -> Option<PathBuf> {
    let p = PathBuf::from(std::env::var_os("PDFIUM_LIB_PATH")?);
    p.exists().then_some(p)
}

// ── Public API ───────────────────────────────────────────────────────────────

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

/// `true` when no download is needed before binding.
pub fn is_pdfium_cached() -> bool {
    RESOLVED.get().is_some() || LibraryCache::default_location().find().is_some()
}

/// Make sure the library is on disk and return its path.
///
/// The result is memoised for the lifetime of the process.
pub fn ensure_pdfium_library(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(p) = RESOLVED.get() {
        return Ok(p.clone());
    }
    let path = LibraryCache::default_location().ensure(on_progress)?;
    Ok(RESOLVED.get_or_init(|| path).clone())
}

/// Ensure the library is present, then bind to it.
pub fn bind_pdfium(on_progress: Option<DownloadProgress<'_>>) -> Result<Pdfium, PdfiumAutoError> {
    let path = ensure_pdfium_library(on_progress)?;
    bind_pdfium_from_path(&path)
}

pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Download / extraction ────────────────────────────────────────────────────

fn download(
    url: &str,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Vec<u8>, PdfiumAutoError> {
    let fail = |reason: String| PdfiumAutoError::Download {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| fail(e.to_string()))?;

    let mut response = client.get(url).send().map_err(|e| fail(e.to_string()))?;
    if !response.status().is_success() {
        return Err(fail(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fail(e.to_string())),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(cb) = on_progress {
            cb(body.len() as u64, total);
        }
    }
    Ok(body)
}

fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let fail = |reason: String| PdfiumAutoError::Extract {
        member: member.to_string(),
        reason,
    };

    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    for entry in tar.entries().map_err(|e| fail(e.to_string()))? {
        let mut entry = entry.map_err(|e| fail(e.to_string()))?;
        let matches = entry
            .path()
            .map(|p| p.to_string_lossy() == member)
            .map_err(|e| fail(e.to_string()))?;
        if matches {
            entry.unpack(dest).map_err(|e| fail(e.to_string()))?;
            return Ok(());
        }
    }
    Err(fail("not present in archive".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_platforms() {
        let linux = Platform::lookup("linux", "x86_64").unwrap();
        assert_eq!(linux.archive, "pdfium-linux-x64.tgz");
        assert_eq!(linux.file_name, "libpdfium.so");

        let win = Platform::lookup("windows", "x86").unwrap();
        assert_eq!(win.file_name, "pdfium.dll");
    }

    #[test]
    fn lookup_unknown_platform() {
        assert!(Platform::lookup("plan9", "mips").is_none());
    }

    #[test]
    fn download_url_carries_version() {
        let p = Platform::lookup("macos", "aarch64").unwrap();
        let url = p.download_url();
        assert!(url.contains(PDFIUM_VERSION));
        assert!(url.ends_with("pdfium-mac-arm64.tgz"));
    }

    #[test]
    fn explicit_cache_dir() {
        let cache = LibraryCache::at("/tmp/pdf2long-cache");
        let p = Platform::lookup("linux", "aarch64").unwrap();
        assert_eq!(
            cache.library_path(&p),
            PathBuf::from("/tmp/pdf2long-cache/libpdfium.so")
        );
    }

    #[test]
    fn default_location_is_versioned() {
        let cache = LibraryCache::default_location();
        assert!(cache.dir().to_string_lossy().contains(PDFIUM_VERSION));
    }

    #[test]
    fn unpack_rejects_garbage() {
        let err = unpack_member(b"not a tarball", "lib/libpdfium.so", Path::new("/tmp/x"));
        assert!(matches!(err, Err(PdfiumAutoError::Extract { .. })));
    }
}
