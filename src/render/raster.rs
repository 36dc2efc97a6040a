use std::time::Instant;

use log::debug;

use crate::backend::{RasterBackend, RgbFrame};
use crate::document::DocumentHandle;
use crate::error::{AppError, AppResult};

use super::cache::{RenderedPageCache, RenderedPageKey};
use super::scale::{ScaleCalculator, scale_eq};
use super::surface::{RenderRequest, RenderedSurface, Viewport, centered_origin};
use super::UnitRenderer;

/// Largest frame one render may allocate, about 200 MB of RGB.
pub const MAX_FRAME_PIXELS: u64 = 8192 * 8192;

pub struct RasterPageRenderer {
    calculator: ScaleCalculator,
    cache: RenderedPageCache,
    /// (unit, zoom) of the previous request; any change evicts the memo.
    last_view: Option<(usize, f32)>,
}

impl RasterPageRenderer {
    pub fn new(calculator: ScaleCalculator, cache_entries: usize) -> Self {
        Self {
            calculator,
            cache: RenderedPageCache::new(cache_entries),
            last_view: None,
        }
    }

    pub fn cache(&self) -> &RenderedPageCache {
        &self.cache
    }

    pub fn render_page(
        &mut self,
        doc: &dyn RasterBackend,
        index: usize,
        scale: f32,
    ) -> AppResult<RgbFrame> {
        let count = doc.page_count();
        if index >= count {
            return Err(AppError::index_out_of_range(index, count));
        }

        let key = RenderedPageKey::new(doc.doc_id(), index, scale);
        if let Some(frame) = self.cache.get(&key) {
            debug!("page {index} at scale {scale:.3} served from memo");
            return Ok(frame);
        }

        let wrap = |err: AppError| match err {
            AppError::Render { .. } | AppError::IndexOutOfRange { .. } => err,
            other => AppError::render(index, other),
        };
        let (width_pt, height_pt) = doc.page_dimensions(index).map_err(wrap)?;
        let width = (f64::from(width_pt) * f64::from(scale)).ceil();
        let height = (f64::from(height_pt) * f64::from(scale)).ceil();
        if width * height > MAX_FRAME_PIXELS as f64 {
            return Err(wrap(AppError::invalid_argument(format!(
                "{width:.0}x{height:.0} frame exceeds the {MAX_FRAME_PIXELS} pixel budget"
            ))));
        }

        let started = Instant::now();
        let frame = doc.render_page(index, scale).map_err(wrap)?;
        let counters = self.cache.counters();
        debug!(
            "rendered page {index} at scale {scale:.3} ({}x{}) in {:.1}ms (memo {} hit, {} miss, {} evicted)",
            frame.width,
            frame.height,
            started.elapsed().as_secs_f64() * 1000.0,
            counters.hits,
            counters.misses,
            counters.evictions
        );
        self.cache.insert(key, frame.clone());
        Ok(frame)
    }

    fn track_view(&mut self, unit: usize, zoom: f32) {
        let unchanged = self
            .last_view
            .is_some_and(|(last_unit, last_zoom)| last_unit == unit && scale_eq(last_zoom, zoom));
        if !unchanged {
            self.cache.clear();
            self.last_view = Some((unit, zoom));
        }
    }
}

impl UnitRenderer for RasterPageRenderer {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn supports_zoom(&self) -> bool {
        true
    }

    fn rescales_on_resize(&self) -> bool {
        self.calculator.policy.rescales_on_resize()
    }

    fn resolve_scale(
        &self,
        doc: &DocumentHandle,
        unit: usize,
        viewport: Viewport,
        zoom: f32,
    ) -> f32 {
        let content = doc
            .intrinsic_size(unit)
            .ok()
            .flatten()
            .unwrap_or((0.0, 0.0));
        self.calculator.compute(content, viewport, zoom)
    }

    fn render(
        &mut self,
        doc: &DocumentHandle,
        request: &RenderRequest,
    ) -> AppResult<RenderedSurface> {
        let raster = doc
            .raster()
            .ok_or_else(|| AppError::unsupported("raster renderer needs a paginated document"))?;

        self.track_view(request.unit, request.zoom);
        let frame = self.render_page(raster, request.unit, request.scale)?;
        let origin = centered_origin(frame.width, frame.height, request.viewport);

        Ok(RenderedSurface::Raster {
            unit: request.unit,
            generation: request.generation,
            frame,
            origin,
        })
    }
}
