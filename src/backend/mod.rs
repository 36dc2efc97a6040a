use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::error::{AppError, AppResult};

mod epub;
mod hayro;
mod traits;

pub use epub::EpubBook;
pub use hayro::PdfDoc;
pub use traits::{Chapter, ChapterSource, RasterBackend, RgbFrame};

pub fn open_default_raster(path: impl AsRef<Path>) -> AppResult<Box<dyn RasterBackend>> {
    PdfDoc::open(path).map(|doc| Box::new(doc) as Box<dyn RasterBackend>)
}

pub fn open_default_chapters(path: impl AsRef<Path>) -> AppResult<Box<dyn ChapterSource>> {
    EpubBook::open(path).map(|book| Box::new(book) as Box<dyn ChapterSource>)
}

pub(crate) fn ensure_regular_file(path: &Path) -> AppResult<()> {
    if path.as_os_str().is_empty() {
        return Err(AppError::open(path, "document path must not be empty"));
    }
    if !path.exists() {
        return Err(AppError::open(path, "file not found"));
    }
    if !path.is_file() {
        return Err(AppError::open(path, "document path must be a regular file"));
    }
    Ok(())
}

pub(crate) fn calculate_doc_id(path: &Path, byte_len: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    byte_len.hash(&mut hasher);
    hasher.finish()
}
