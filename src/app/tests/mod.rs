mod render_worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{RasterBackend, RgbFrame};
use crate::error::{AppError, AppResult};

/// In-memory paginated document with 200x100pt pages.
pub(super) struct StubPdf {
    path: PathBuf,
    pages: usize,
    fail_page: Option<usize>,
    pub(super) renders: Arc<AtomicUsize>,
}

impl StubPdf {
    pub(super) fn new(pages: usize) -> Self {
        Self {
            path: PathBuf::from("stub.pdf"),
            pages,
            fail_page: None,
            renders: Arc::default(),
        }
    }

    pub(super) fn failing_on(mut self, page: usize) -> Self {
        self.fail_page = Some(page);
        self
    }
}

impl RasterBackend for StubPdf {
    fn path(&self) -> &Path {
        &self.path
    }

    fn doc_id(&self) -> u64 {
        42
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_dimensions(&self, page: usize) -> AppResult<(f32, f32)> {
        if page >= self.pages {
            return Err(AppError::index_out_of_range(page, self.pages));
        }
        Ok((200.0, 100.0))
    }

    fn render_page(&self, page: usize, scale: f32) -> AppResult<RgbFrame> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fail_page == Some(page) {
            return Err(AppError::invalid_argument("simulated decode fault"));
        }
        let width = (200.0 * scale).round().max(1.0) as u32;
        let height = (100.0 * scale).round().max(1.0) as u32;
        let shade = (page as u8).wrapping_mul(40);
        Ok(RgbFrame {
            width,
            height,
            pixels: vec![shade; width as usize * height as usize * RgbFrame::CHANNELS].into(),
        })
    }
}
