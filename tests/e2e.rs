//! End-to-end tests with real pdfium rendering.
//!
//! These need a pdfium library (downloaded on first use) and are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in CI
//! unless explicitly requested. Sample documents are generated on the fly;
//! any extra PDFs dropped into `./test_cases/` are converted too.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use pdf2long::{
    convert, convert_dir, convert_to_file, inspect, AlwaysOverwrite, BatchOptions,
    ConversionConfig, OutputFormat, Pdf2LongError, WidthPolicy,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

/// Write a US-letter PDF with one filled black rectangle per page.
///
/// Each rectangle is `(x, y, w, h)` in PDF points, origin bottom-left.
fn write_sample_pdf(path: &Path, rects: &[(u32, u32, u32, u32)]) {
    let n = rects.len();
    let mut objects: Vec<String> = Vec::new();

    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        n
    ));
    for (i, (x, y, w, h)) in rects.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R >>",
            4 + 2 * i
        ));
        let stream = format!("0 0 0 rg {x} {y} {w} {h} re f");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for off in offsets {
        out.push_str(&format!("{off:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    std::fs::write(path, out).unwrap();
}

fn two_page_sample(dir: &Path) -> PathBuf {
    let p = dir.join("sample.pdf");
    // 200x50 pt and 100x300 pt blocks
    write_sample_pdf(&p, &[(100, 100, 200, 50), (50, 400, 100, 300)]);
    p
}

fn assert_close(actual: u32, expected: u32, what: &str) {
    assert!(
        actual.abs_diff(expected) <= 2,
        "{what}: expected ≈{expected}, got {actual}"
    );
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_generated_pdf() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_sample(dir.path());

    let info = inspect(&pdf).await.expect("inspect() should succeed");
    assert_eq!(info.page_count, 2);
    assert!(!info.pdf_version.is_empty());
    println!("Metadata: {:?}", info);
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    e2e_skip_unless_enabled!();
    let err = inspect("/definitely/not/a/real/file.pdf").await.unwrap_err();
    assert!(matches!(err, Pdf2LongError::FileNotFound { .. }));
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_crops_to_content_at_72_dpi() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_sample(dir.path());

    let config = ConversionConfig::builder()
        .dpi(72)
        .crop_margin(0)
        .build()
        .unwrap();
    let out = convert(&pdf, &config).await.expect("conversion should succeed");

    assert_eq!(out.stats.page_count, 2);
    assert_eq!(out.info.as_ref().map(|i| i.page_count), Some(2));
    // AutoWidth: widest crop is 200 px, heights 50 + 300
    assert_close(out.stats.width, 200, "width");
    assert_close(out.stats.height, 350, "height");
}

#[tokio::test]
async fn test_convert_fixed_width_with_spacing_scales_with_dpi() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_sample(dir.path());

    let config = ConversionConfig::builder()
        .dpi(144)
        .crop_margin(0)
        .spacing(20)
        .width_policy(WidthPolicy::FixedWidth)
        .build()
        .unwrap();
    let out = convert(&pdf, &config).await.unwrap();
    assert_close(out.stats.width, 400, "width");
    assert_close(out.stats.height, 100 + 20 + 600, "height");
}

#[tokio::test]
async fn test_convert_without_crop_keeps_page_size() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_sample(dir.path());

    let config = ConversionConfig::builder()
        .dpi(72)
        .auto_crop(false)
        .width_policy(WidthPolicy::FixedWidth)
        .build()
        .unwrap();
    let out = convert(&pdf, &config).await.unwrap();
    assert_eq!((out.stats.width, out.stats.height), (612, 1584));
}

#[tokio::test]
async fn test_convert_to_file_writes_jpeg() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_sample(dir.path());
    let out_path = dir.path().join("out/sample.jpg");

    let config = ConversionConfig::builder()
        .format(OutputFormat::Jpeg)
        .quality(70)
        .build()
        .unwrap();
    let stats = convert_to_file(&pdf, &out_path, &config, &AlwaysOverwrite)
        .await
        .unwrap()
        .expect("nothing to decline for a new file");

    let bytes = std::fs::read(&out_path).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (stats.width, stats.height));
}

#[tokio::test]
async fn test_corrupt_pdf_is_rendering_error() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("corrupt.pdf");
    std::fs::write(&pdf, b"%PDF-1.4\nthis is not a pdf body at all\n").unwrap();

    let err = convert(&pdf, &ConversionConfig::default()).await.unwrap_err();
    assert_eq!(err.exit_code(), 2, "{err}");
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_over_test_cases() {
    e2e_skip_unless_enabled!();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_sample_pdf(&input.path().join("one.pdf"), &[(10, 10, 100, 100)]);
    std::fs::create_dir_all(input.path().join("sub")).unwrap();
    write_sample_pdf(&input.path().join("sub/two.pdf"), &[(10, 10, 50, 50); 3]);

    // Copy in any real-world samples that happen to be present.
    if let Ok(entries) = std::fs::read_dir(test_cases_dir()) {
        for entry in entries.flatten() {
            let p = entry.path();
            if p.extension().is_some_and(|e| e == "pdf") {
                std::fs::copy(&p, input.path().join(entry.file_name())).unwrap();
            }
        }
    }

    let options = BatchOptions {
        jobs: 2,
        ..BatchOptions::default()
    };
    let summary = convert_dir(input.path(), output.path(), &options, &ConversionConfig::default())
        .await
        .unwrap();

    for item in &summary.items {
        println!("{} → {:?}", item.input.display(), item.outcome);
    }
    assert_eq!(summary.failed, 0);
    assert!(output.path().join("one_long_screenshot.png").exists());
    assert!(output.path().join("sub/two_long_screenshot.png").exists());
    assert_eq!(summary.exit_code(), 0);
}
