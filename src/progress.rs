//! Progress-callback traits for conversion and batch events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages.
//!
//! The pipeline drives a single conversion on one thread, so the per-page
//! methods of one conversion are called strictly in page order and never
//! concurrently. The trait is still `Send + Sync` because the pipeline runs
//! on a blocking worker thread and batch mode shares one callback between
//! several documents in flight.
//!
//! # Example
//!
//! ```rust
//! use pdf2long::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl ConversionProgressCallback for Counter {
//!     fn on_page_normalized(&self, page_num: usize, total_pages: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::batch::BatchItem;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Page numbers are 1-indexed.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after rasterisation, when the page count is known.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called by the rasteriser after each page is rendered.
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once per page after it has been flattened and cropped.
    ///
    /// On success this fires exactly `total_pages` times with
    /// `page_num = 1..=total_pages` in order.
    fn on_page_normalized(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once before the pages are stacked onto the canvas.
    fn on_composing(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called once with the size of the finished canvas.
    fn on_conversion_complete(&self, width: u32, height: u32) {
        let _ = (width, height);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Events emitted by [`crate::batch::convert_dir`].
pub trait BatchProgressCallback: Send + Sync {
    /// Called once with the number of PDF files found.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called as each file finishes, in completion order (not input order).
    ///
    /// `completed` counts finished files so far, starting at 1.
    fn on_file_complete(&self, completed: usize, total_files: usize, item: &BatchItem) {
        let _ = (completed, total_files, item);
    }
}

impl BatchProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_conversion_start(&self, total_pages: usize) {
            self.events.lock().unwrap().push(format!("start {total_pages}"));
        }

        fn on_page_normalized(&self, page_num: usize, total_pages: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page {page_num}/{total_pages}"));
        }

        fn on_conversion_complete(&self, width: u32, height: u32) {
            self.events.lock().unwrap().push(format!("done {width}x{height}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(3);
        cb.on_page_rendered(1, 3);
        cb.on_page_normalized(1, 3);
        cb.on_composing(3);
        cb.on_conversion_complete(10, 20);
        cb.on_batch_start(2);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_conversion_start(2);
        rec.on_page_rendered(1, 2); // default no-op
        rec.on_page_normalized(1, 2);
        rec.on_page_normalized(2, 2);
        rec.on_conversion_complete(100, 50);

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start 2", "page 1/2", "page 2/2", "done 100x50"]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(10);
        cb.on_page_normalized(1, 10);
    }
}
