use std::path::{Path, PathBuf};

use crate::backend::RgbFrame;

/// Display area in pixels, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Everything a renderer needs, captured when the request is issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub generation: u64,
    pub unit: usize,
    pub zoom: f32,
    pub viewport: Viewport,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedSurface {
    Raster {
        unit: usize,
        generation: u64,
        frame: RgbFrame,
        /// Top-left corner that centers the frame in the viewport. Negative
        /// when the frame overflows and the host has to scroll or crop.
        origin: (i32, i32),
    },
    Layout {
        unit: usize,
        generation: u64,
        location: PathBuf,
    },
}

impl RenderedSurface {
    pub fn unit(&self) -> usize {
        match self {
            Self::Raster { unit, .. } | Self::Layout { unit, .. } => *unit,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Raster { generation, .. } | Self::Layout { generation, .. } => *generation,
        }
    }

    pub fn frame(&self) -> Option<&RgbFrame> {
        match self {
            Self::Raster { frame, .. } => Some(frame),
            Self::Layout { .. } => None,
        }
    }

    pub fn location(&self) -> Option<&Path> {
        match self {
            Self::Raster { .. } => None,
            Self::Layout { location, .. } => Some(location),
        }
    }
}

pub fn centered_origin(frame_width: u32, frame_height: u32, viewport: Viewport) -> (i32, i32) {
    let offset = |outer: u32, inner: u32| (i64::from(outer) - i64::from(inner)) / 2;
    (
        offset(viewport.width, frame_width) as i32,
        offset(viewport.height, frame_height) as i32,
    )
}
