use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use log::debug;

use crate::backend::RgbFrame;
use crate::error::{AppError, AppResult};
use crate::render::RenderedSurface;

use super::traits::SurfacePresenter;

/// Writes raster surfaces to a PNG file, overwriting it on every
/// presentation. Layout surfaces are already on disk and are only reported.
#[derive(Debug)]
pub struct FilePresenter {
    out: PathBuf,
    presented: u64,
}

impl FilePresenter {
    pub fn new(out: impl Into<PathBuf>) -> Self {
        Self {
            out: out.into(),
            presented: 0,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl SurfacePresenter for FilePresenter {
    fn name(&self) -> &'static str {
        "file"
    }

    fn present(&mut self, surface: &RenderedSurface) -> AppResult<String> {
        let line = match surface {
            RenderedSurface::Raster {
                unit,
                frame,
                origin,
                ..
            } => {
                write_png(frame, &self.out)?;
                format!(
                    "page {} {}x{} at ({}, {}) -> {}",
                    unit + 1,
                    frame.width,
                    frame.height,
                    origin.0,
                    origin.1,
                    self.out.display()
                )
            }
            RenderedSurface::Layout { unit, location, .. } => {
                format!("chapter {} -> {}", unit + 1, location.display())
            }
        };
        self.presented += 1;
        debug!("presented surface #{}: {line}", self.presented);
        Ok(line)
    }
}

pub(crate) fn write_png(frame: &RgbFrame, out: &Path) -> AppResult<()> {
    let image = RgbImage::from_raw(frame.width, frame.height, frame.pixels.to_vec()).ok_or(
        AppError::invalid_argument("rgb frame pixels length does not match dimensions"),
    )?;
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| {
            AppError::io_with_context(err, format!("failed to create {}", parent.display()))
        })?;
    }
    image
        .save_with_format(out, ImageFormat::Png)
        .map_err(|err| AppError::invalid_argument(format!("failed to write png: {err}")))
}
