//! Content bounding-box detection.
//!
//! A pixel is *background* when all three channels are strictly greater than
//! the white threshold (250 by default). Each edge scan walks inward from one
//! side and stops at the first row or column holding a non-background pixel.
//!
//! Scans work on the raw interleaved RGB buffer one row at a time. The
//! left/right scans therefore reduce each row to its first/last content
//! pixel instead of walking columns, which visits memory in order but finds
//! the same column a column-major scan would.

use image::{Rgb, RgbImage};

/// Default brightness threshold above which a channel counts as white.
pub const DEFAULT_WHITE_THRESHOLD: u8 = 250;

/// Axis-aligned pixel rectangle, half-open on the right and bottom.
///
/// `image[left..right, top..bottom]` addresses exactly the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    /// The whole of a `width × height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// `true` when the box covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Grow by `margin` on every side, clamped to a `width × height` image.
    pub fn expand(&self, margin: u32, width: u32, height: u32) -> Self {
        Self {
            left: self.left.saturating_sub(margin),
            top: self.top.saturating_sub(margin),
            right: self.right.saturating_add(margin).min(width),
            bottom: self.bottom.saturating_add(margin).min(height),
        }
    }
}

/// `true` when every channel of `px` exceeds `threshold`.
#[inline]
pub fn is_background(px: &Rgb<u8>, threshold: u8) -> bool {
    is_background_slice(&px.0, threshold)
}

#[inline]
fn is_background_slice(px: &[u8], threshold: u8) -> bool {
    px.iter().all(|&c| c > threshold)
}

fn row(img: &RgbImage, y: u32) -> &[u8] {
    let stride = img.width() as usize * 3;
    let start = y as usize * stride;
    &img.as_raw()[start..start + stride]
}

fn row_has_content(img: &RgbImage, y: u32, threshold: u8) -> bool {
    row(img, y)
        .chunks_exact(3)
        .any(|px| !is_background_slice(px, threshold))
}

/// Index of the first column holding content.
pub fn left_edge(img: &RgbImage, threshold: u8) -> Option<u32> {
    let mut best: Option<u32> = None;
    for y in 0..img.height() {
        // Only the part of the row left of the current best can improve it.
        let limit = best.unwrap_or(img.width()) as usize;
        if limit == 0 {
            break;
        }
        let hit = row(img, y)[..limit * 3]
            .chunks_exact(3)
            .position(|px| !is_background_slice(px, threshold));
        if let Some(x) = hit {
            best = Some(x as u32);
        }
    }
    best
}

/// One past the last column holding content.
pub fn right_edge(img: &RgbImage, threshold: u8) -> Option<u32> {
    let width = img.width();
    let mut best: Option<u32> = None;
    for y in 0..img.height() {
        let floor = best.unwrap_or(0) as usize;
        if floor == width as usize {
            break;
        }
        let hit = row(img, y)[floor * 3..]
            .chunks_exact(3)
            .rposition(|px| !is_background_slice(px, threshold));
        if let Some(x) = hit {
            best = Some((floor + x + 1) as u32);
        }
    }
    best
}

/// Index of the first row holding content.
pub fn top_edge(img: &RgbImage, threshold: u8) -> Option<u32> {
    (0..img.height()).find(|&y| row_has_content(img, y, threshold))
}

/// One past the last row holding content.
pub fn bottom_edge(img: &RgbImage, threshold: u8) -> Option<u32> {
    (0..img.height())
        .rev()
        .find(|&y| row_has_content(img, y, threshold))
        .map(|y| y + 1)
}

/// Tightest box enclosing every non-background pixel.
///
/// Returns `None` when the image is entirely background; callers fall back
/// to the full image (see [`detect_or_full`]) rather than cropping to nothing.
pub fn detect_bounding_box(img: &RgbImage, threshold: u8) -> Option<BoundingBox> {
    // A blank image has no top edge, so the other three scans are skipped.
    let top = top_edge(img, threshold)?;
    let bottom = bottom_edge(img, threshold)?;
    let left = left_edge(img, threshold)?;
    let right = right_edge(img, threshold)?;
    Some(BoundingBox {
        left,
        top,
        right,
        bottom,
    })
}

/// [`detect_bounding_box`], collapsing "no content" to the full image.
pub fn detect_or_full(img: &RgbImage, threshold: u8) -> BoundingBox {
    detect_bounding_box(img, threshold)
        .unwrap_or_else(|| BoundingBox::full(img.width(), img.height()))
}
