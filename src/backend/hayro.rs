use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_syntax::Pdf;
use hayro::vello_cpu::color::palette::css::WHITE;
use hayro::{RenderSettings, render};

use crate::error::{AppError, AppResult};

use super::traits::{RasterBackend, RgbFrame};
use super::{calculate_doc_id, ensure_regular_file};

pub struct PdfDoc {
    path: PathBuf,
    doc_id: u64,
    pdf: Pdf,
}

impl RasterBackend for PdfDoc {
    fn path(&self) -> &Path {
        PdfDoc::path(self)
    }

    fn doc_id(&self) -> u64 {
        PdfDoc::doc_id(self)
    }

    fn page_count(&self) -> usize {
        PdfDoc::page_count(self)
    }

    fn page_dimensions(&self, page: usize) -> AppResult<(f32, f32)> {
        PdfDoc::page_render_dimensions(self, page)
    }

    fn render_page(&self, page: usize, scale: f32) -> AppResult<RgbFrame> {
        PdfDoc::render_page(self, page, scale)
    }
}

impl PdfDoc {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        ensure_regular_file(path)?;

        let bytes = std::fs::read(path).map_err(|err| AppError::open(path, err.to_string()))?;
        Self::from_bytes(path, bytes)
    }

    pub fn from_bytes(path: impl AsRef<Path>, bytes: Vec<u8>) -> AppResult<Self> {
        let path = path.as_ref();
        if !bytes.starts_with(b"%PDF-") {
            return Err(AppError::open(path, "input is not a valid PDF header"));
        }
        let doc_id = calculate_doc_id(path, bytes.len() as u64);
        let pdf = Pdf::new(Arc::new(bytes))
            .map_err(|_| AppError::open(path, "failed to parse PDF with hayro"))?;

        Ok(Self {
            path: path.to_path_buf(),
            doc_id,
            pdf,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn doc_id(&self) -> u64 {
        self.doc_id
    }

    pub fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    pub fn page_render_dimensions(&self, page: usize) -> AppResult<(f32, f32)> {
        let page_ref = self
            .pdf
            .pages()
            .get(page)
            .ok_or(AppError::index_out_of_range(page, self.page_count()))?;

        Ok(page_ref.render_dimensions())
    }

    pub fn render_page(&self, page: usize, scale: f32) -> AppResult<RgbFrame> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AppError::invalid_argument(
                "scale must be a positive finite value",
            ));
        }

        let page_ref = self
            .pdf
            .pages()
            .get(page)
            .ok_or(AppError::index_out_of_range(page, self.page_count()))?;

        let render_settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            bg_color: WHITE,
            ..Default::default()
        };
        let interpreter_settings = InterpreterSettings::default();

        // Malformed content streams can panic deep inside the interpreter.
        let pixmap = panic::catch_unwind(AssertUnwindSafe(|| {
            render(page_ref, &interpreter_settings, &render_settings)
        }))
        .map_err(|_| {
            AppError::render(
                page,
                AppError::unsupported("PDF interpreter aborted while drawing page"),
            )
        })?;

        Ok(RgbFrame::from_rgba(
            pixmap.width() as u32,
            pixmap.height() as u32,
            pixmap.data_as_u8_slice(),
        ))
    }
}
