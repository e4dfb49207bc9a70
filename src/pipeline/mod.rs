//! Pipeline stages for PDF-to-long-image conversion.
//!
//! Each submodule implements one step. [`driver`] runs render, normalize
//! and compose in order; [`crate::convert`] wraps it with the input check
//! and the encoder.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ normalize ──▶ compose ──▶ encode
//! (path)    (pdfium)   (RGB, crop)   (canvas)    (PNG/JPEG)
//!                         ▲
//!                       bounds
//! ```
//!
//! 1. [`input`]:     check the path names a readable PDF of sane size
//! 2. [`render`]:    rasterise every page at the configured DPI; blocking,
//!    so the async entry points run it in `spawn_blocking`
//! 3. [`normalize`]: flatten each page onto white RGB and crop it to its
//!    content, using [`bounds`] to find the content box
//! 4. [`compose`]:   stack the pages into one canvas under a width policy
//! 5. [`encode`]:    write the canvas as PNG or JPEG

pub mod bounds;
pub mod compose;
pub mod driver;
pub mod encode;
pub mod input;
pub mod normalize;
pub mod render;
