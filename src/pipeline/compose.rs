//! Canvas composition: stack normalised pages top-to-bottom into one image.
//!
//! ```text
//!   AutoWidth                 FixedWidth
//!   ┌────────────┐            ┌────────────┐
//!   │page 1    ░░│            │░ page 1  ░░│
//!   ├────────────┤ spacing    ├────────────┤
//!   │page 2 (max)│            │page 2 (max)│
//!   ├────────────┤            ├────────────┤
//!   │page 3  ░░░░│            │░░ page 3 ░░│
//!   └────────────┘            └────────────┘
//! ```
//!
//! AutoWidth then drops any blank columns right of the rightmost content
//! pixel on the whole canvas; FixedWidth keeps the widest page's width.
//!
//! Each page occupies its own disjoint band of rows, so pastes never touch
//! one another and page order is the only ordering that matters.

use super::bounds::right_edge;
use crate::config::{LayoutPolicy, WidthPolicy};
use crate::error::Pdf2LongError;
use image::{ImageBuffer, RgbImage};
use tracing::debug;

/// Width and height of the canvas before any AutoWidth trim.
///
/// Height is the sum of page heights plus `spacing × (n − 1)`.
pub fn canvas_size(pages: &[RgbImage], spacing: u32) -> Result<(u32, u32), Pdf2LongError> {
    if pages.is_empty() {
        return Err(empty_pages());
    }

    let width = pages.iter().map(|p| p.width()).max().unwrap_or(0);
    let gaps = (pages.len() as u64 - 1) * spacing as u64;
    let height = pages.iter().map(|p| p.height() as u64).sum::<u64>() + gaps;
    let height = u32::try_from(height).map_err(|_| {
        Pdf2LongError::Composition(format!("canvas height {height} px exceeds the u32 limit"))
    })?;
    Ok((width, height))
}

/// Stack `pages` into one RGB canvas according to `layout`.
///
/// Pages are read, never modified. Fails with
/// [`Pdf2LongError::Composition`] when `pages` is empty or the canvas
/// cannot be allocated.
pub fn compose(pages: &[RgbImage], layout: LayoutPolicy) -> Result<RgbImage, Pdf2LongError> {
    let (width, height) = canvas_size(pages, layout.spacing)?;
    debug!(
        "Composing {} pages onto {}x{} canvas ({:?}, spacing {})",
        pages.len(),
        width,
        height,
        layout.width,
        layout.spacing
    );

    let mut canvas = white_canvas(width, height)?;

    let mut y = 0i64;
    for page in pages {
        let x = match layout.width {
            WidthPolicy::AutoWidth => 0,
            WidthPolicy::FixedWidth => ((width - page.width()) / 2) as i64,
        };
        image::imageops::replace(&mut canvas, page, x, y);
        y += page.height() as i64 + layout.spacing as i64;
    }

    if layout.width == WidthPolicy::AutoWidth {
        canvas = trim_right(canvas, layout.white_threshold);
    }
    Ok(canvas)
}

/// Drop blank columns on the right of an AutoWidth canvas.
///
/// A canvas with no content at all keeps its full width.
fn trim_right(canvas: RgbImage, threshold: u8) -> RgbImage {
    let (width, height) = canvas.dimensions();
    match right_edge(&canvas, threshold) {
        Some(actual) if actual < width => {
            debug!("Trimming canvas width {} → {}", width, actual);
            image::imageops::crop_imm(&canvas, 0, 0, actual, height).to_image()
        }
        _ => canvas,
    }
}

/// Allocate an opaque white canvas, reporting allocation failure instead
/// of aborting.
fn white_canvas(width: u32, height: u32) -> Result<RgbImage, Pdf2LongError> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| {
            Pdf2LongError::Composition(format!("canvas {width}x{height} is too large to address"))
        })?;

    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        Pdf2LongError::Composition(format!("cannot allocate {width}x{height} canvas: {e}"))
    })?;
    buf.resize(len, 255);

    ImageBuffer::from_raw(width, height, buf).ok_or_else(|| {
        Pdf2LongError::Composition(format!("buffer does not fit a {width}x{height} canvas"))
    })
}

fn empty_pages() -> Pdf2LongError {
    Pdf2LongError::Composition("Cannot compose empty page list".into())
}
