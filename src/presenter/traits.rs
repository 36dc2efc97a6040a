use crate::error::AppResult;
use crate::render::RenderedSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterKind {
    File,
}

/// Hands finished surfaces to whatever displays them.
pub trait SurfacePresenter {
    fn name(&self) -> &'static str;

    /// Displays `surface` and returns a one-line description for the status line.
    fn present(&mut self, surface: &RenderedSurface) -> AppResult<String>;
}
