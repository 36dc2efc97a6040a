use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AppResult;

/// Opaque RGB pixel buffer, 3 bytes per pixel, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl RgbFrame {
    pub const CHANNELS: usize = 3;

    /// Drops the alpha channel of an RGBA buffer rendered onto an opaque background.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Self {
        let pixels: Vec<u8> = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let px = self.pixels.get(offset..offset + Self::CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }
}

/// Fixed-layout document decoded by an external PDF engine.
pub trait RasterBackend: Send {
    fn path(&self) -> &Path;
    fn doc_id(&self) -> u64;
    fn page_count(&self) -> usize;
    /// Page size in points.
    fn page_dimensions(&self, page: usize) -> AppResult<(f32, f32)>;
    fn render_page(&self, page: usize, scale: f32) -> AppResult<RgbFrame>;
}

/// Raw markup of one spine entry plus its location inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub path: PathBuf,
    pub markup: String,
}

/// Reflowable chaptered document read from an external container parser.
pub trait ChapterSource: Send {
    fn path(&self) -> &Path;
    fn doc_id(&self) -> u64;
    fn chapter_count(&self) -> usize;
    fn chapter(&self, index: usize) -> AppResult<Chapter>;
    /// Looks up a resource by its full path inside the container.
    fn resource(&self, archive_path: &Path) -> Option<Vec<u8>>;
}
