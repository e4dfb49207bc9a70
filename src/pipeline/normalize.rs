//! Page normalisation: flatten to opaque RGB, then optionally trim white
//! borders.
//!
//! Rasterisers hand back whatever pixel layout suits them (pdfium produces
//! BGRA that `pdfium-render` exposes as RGBA). The compositor only deals in
//! `RgbImage`, so every page passes through [`flatten_to_rgb`] first.
//! Transparent regions are blended over white, matching how the page looks
//! on paper, instead of being dropped to black by a plain channel strip.

use super::bounds::detect_bounding_box;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

/// Convert any pixel layout to opaque 8-bit RGB.
///
/// * Already `Rgb8` → returned as-is, no copy.
/// * Has an alpha channel → composited over white:
///   `out = a·src + (1 − a)·255`, rounded to nearest.
/// * Anything else (grey, 16-bit, float) → the `image` crate's standard
///   conversion (grey is replicated to all three channels).
pub fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other if other.color().has_alpha() => {
            let rgba = other.into_rgba8();
            let (w, h) = rgba.dimensions();
            let mut out = RgbImage::new(w, h);
            for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
                let [r, g, b, a] = src.0;
                *dst = Rgb([over_white(r, a), over_white(g, a), over_white(b, a)]);
            }
            out
        }
        other => other.into_rgb8(),
    }
}

#[inline]
fn over_white(c: u8, a: u8) -> u8 {
    let (c, a) = (c as u32, a as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Crop `img` to its content plus `margin` pixels on each side.
///
/// The image is returned untouched when it is entirely background, when the
/// clamped box is empty, or when the box already covers the whole image.
pub fn crop_to_content(img: RgbImage, margin: u32, threshold: u8) -> RgbImage {
    let (w, h) = img.dimensions();
    let Some(content) = detect_bounding_box(&img, threshold) else {
        debug!("No content found in {}x{} page, keeping it uncropped", w, h);
        return img;
    };

    let b = content.expand(margin, w, h);
    if b.is_empty() || (b.width() == w && b.height() == h) {
        return img;
    }

    debug!(
        "Cropping {}x{} → {}x{} (box {},{}..{},{})",
        w,
        h,
        b.width(),
        b.height(),
        b.left,
        b.top,
        b.right,
        b.bottom
    );
    image::imageops::crop_imm(&img, b.left, b.top, b.width(), b.height()).to_image()
}

/// Flatten a rasterised page and, when `auto_crop` is set, trim it.
pub fn normalize(img: DynamicImage, auto_crop: bool, crop_margin: u32, threshold: u8) -> RgbImage {
    let rgb = flatten_to_rgb(img);
    if auto_crop {
        crop_to_content(rgb, crop_margin, threshold)
    } else {
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bounds::DEFAULT_WHITE_THRESHOLD;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn page_with_block(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(w, h, WHITE);
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Rgb([10, 20, 30]));
            }
        }
        img
    }

    #[test]
    fn half_transparent_red_blends_over_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128])));
        let rgb = flatten_to_rgb(img);
        let Rgb([r, g, b]) = *rgb.get_pixel(1, 1);
        let expected = (0.5 * 0.0 + 0.5 * 255.0) as i32; // 127
        assert_eq!(r, 255);
        assert!((g as i32 - expected).abs() <= 1, "g = {g}");
        assert!((b as i32 - expected).abs() <= 1, "b = {b}");
    }

    #[test]
    fn fully_transparent_becomes_white_and_opaque_is_kept() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([12, 34, 56, 255]));
        let rgb = flatten_to_rgb(DynamicImage::ImageRgba8(rgba));
        assert_eq!(*rgb.get_pixel(0, 0), WHITE);
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([12, 34, 56]));
    }

    #[test]
    fn grey_is_replicated_to_rgb() {
        let grey = GrayImage::from_pixel(3, 2, Luma([90]));
        let rgb = flatten_to_rgb(DynamicImage::ImageLuma8(grey));
        assert_eq!(rgb.dimensions(), (3, 2));
        assert_eq!(*rgb.get_pixel(2, 1), Rgb([90, 90, 90]));
    }

    #[test]
    fn rgb_passes_through_unchanged() {
        let src = page_with_block(8, 8, 2, 2, 4, 4);
        let out = flatten_to_rgb(DynamicImage::ImageRgb8(src.clone()));
        assert_eq!(out, src);
    }

    #[test]
    fn crop_keeps_margin_around_content() {
        let page = page_with_block(100, 80, 30, 20, 50, 40);
        let out = crop_to_content(page, 5, DEFAULT_WHITE_THRESHOLD);
        // content 20x20 + 5px each side
        assert_eq!(out.dimensions(), (30, 30));
        assert_eq!(*out.get_pixel(0, 0), WHITE);
        assert_eq!(*out.get_pixel(5, 5), Rgb([10, 20, 30]));
    }

    #[test]
    fn crop_margin_is_clamped_to_page() {
        let page = page_with_block(40, 40, 2, 3, 38, 10);
        let out = crop_to_content(page, 10, DEFAULT_WHITE_THRESHOLD);
        // left/right/top clamp to the page edge; bottom is 10 + 10 = 20
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn blank_page_is_not_cropped() {
        let page = RgbImage::from_pixel(64, 48, WHITE);
        let out = normalize(
            DynamicImage::ImageRgb8(page.clone()),
            true,
            10,
            DEFAULT_WHITE_THRESHOLD,
        );
        assert_eq!(out, page);
    }

    #[test]
    fn auto_crop_disabled_keeps_dimensions() {
        let page = page_with_block(100, 80, 30, 20, 50, 40);
        let out = normalize(DynamicImage::ImageRgb8(page), false, 0, DEFAULT_WHITE_THRESHOLD);
        assert_eq!(out.dimensions(), (100, 80));
    }

    #[test]
    fn alpha_is_flattened_before_cropping() {
        // Transparent everywhere except an opaque dark square: after blending
        // the transparent area is white, so cropping finds just the square.
        let mut rgba = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 0]));
        for y in 10..20 {
            for x in 15..25 {
                rgba.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let out = normalize(DynamicImage::ImageRgba8(rgba), true, 0, DEFAULT_WHITE_THRESHOLD);
        assert_eq!(out.dimensions(), (10, 10));
    }
}
