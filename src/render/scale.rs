use serde::Deserialize;

use super::surface::Viewport;

pub(crate) const POINTS_PER_INCH: f32 = 72.0;
pub(crate) const DEGENERATE_SCALE: f32 = 1.0;

/// How a raster page's render scale reacts to the window.
///
/// The two policies give a different navigation feel and are not
/// interchangeable: fit-window re-scales on every resize, fixed-dpi keeps the
/// pixel density stable and leaves overflow to host scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderPolicy {
    #[default]
    FitWindow,
    FixedDpi,
}

impl RenderPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FitWindow => "fit-window",
            Self::FixedDpi => "fixed-dpi",
        }
    }

    pub fn rescales_on_resize(self) -> bool {
        matches!(self, Self::FitWindow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleCalculator {
    pub policy: RenderPolicy,
    pub dpi_base: f32,
}

impl ScaleCalculator {
    pub fn new(policy: RenderPolicy, dpi_base: f32) -> Self {
        Self { policy, dpi_base }
    }

    pub fn compute(&self, content: (f32, f32), viewport: Viewport, zoom: f32) -> f32 {
        match self.policy {
            RenderPolicy::FitWindow => compute_scale(
                content.0,
                content.1,
                viewport.width as f32,
                viewport.height as f32,
                zoom,
            ),
            RenderPolicy::FixedDpi => compute_fixed_dpi_scale(self.dpi_base, zoom),
        }
    }
}

/// Fit the content inside the viewport, then apply the user zoom. Not clamped
/// above, so zooming can exceed 1:1 pixel density.
pub fn compute_scale(
    content_width: f32,
    content_height: f32,
    viewport_width: f32,
    viewport_height: f32,
    zoom_factor: f32,
) -> f32 {
    let dims = [content_width, content_height, viewport_width, viewport_height];
    if dims.iter().any(|value| !value.is_finite() || *value <= 0.0) {
        return DEGENERATE_SCALE;
    }

    let fit = (viewport_width / content_width).min(viewport_height / content_height);
    sanitize(fit * zoom_factor)
}

pub fn compute_fixed_dpi_scale(dpi_base: f32, zoom_factor: f32) -> f32 {
    if !dpi_base.is_finite() || dpi_base <= 0.0 {
        return DEGENERATE_SCALE;
    }
    sanitize(dpi_base * zoom_factor / POINTS_PER_INCH)
}

fn sanitize(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        DEGENERATE_SCALE
    }
}

pub(crate) fn scale_eq(left: f32, right: f32) -> bool {
    (left - right).abs() <= 0.0005
}
