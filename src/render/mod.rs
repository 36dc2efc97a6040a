pub mod cache;
mod raster;
mod reflow;
mod scale;
mod surface;
pub mod worker;

pub use raster::{MAX_FRAME_PIXELS, RasterPageRenderer};
pub use reflow::{BASELINE_STYLESHEET, PreparedChapter, ReflowableChapterRenderer, prepare_markup};
pub use scale::{RenderPolicy, ScaleCalculator, compute_fixed_dpi_scale, compute_scale};
pub(crate) use scale::scale_eq;
pub use surface::{RenderRequest, RenderedSurface, Viewport, centered_origin};

use crate::config::RenderConfig;
use crate::document::{DocumentHandle, DocumentVariant};
use crate::error::AppResult;

/// Variant-specific rendering behind one interface, so the controller never
/// looks at the concrete document type.
pub trait UnitRenderer: Send {
    fn name(&self) -> &'static str;

    /// Whether zoom commands mean anything for this renderer.
    fn supports_zoom(&self) -> bool;

    /// Whether a viewport change requires a fresh render.
    fn rescales_on_resize(&self) -> bool;

    fn resolve_scale(
        &self,
        doc: &DocumentHandle,
        unit: usize,
        viewport: Viewport,
        zoom: f32,
    ) -> f32;

    fn render(
        &mut self,
        doc: &DocumentHandle,
        request: &RenderRequest,
    ) -> AppResult<RenderedSurface>;
}

pub fn renderer_for(
    doc: &DocumentHandle,
    config: &RenderConfig,
) -> AppResult<Box<dyn UnitRenderer>> {
    Ok(match doc.variant() {
        DocumentVariant::Raster => Box::new(RasterPageRenderer::new(
            ScaleCalculator::new(config.policy, config.dpi_base),
            config.cache_entries,
        )),
        DocumentVariant::Reflowable => Box::new(ReflowableChapterRenderer::new()?),
    })
}
