use crate::command::Command;
use crate::render::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    /// The document has no units; navigation and rendering are inert.
    Empty,
    Ready,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusState {
    pub message: String,
    pub last_command: Option<Command>,
}

/// Navigation and zoom state. Only the controller writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub current_index: usize,
    /// Only meaningful for raster documents.
    pub zoom_factor: f32,
    pub viewport: Viewport,
    pub status: StatusState,
}

impl ViewerState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            current_index: 0,
            zoom_factor: 1.0,
            viewport,
            status: StatusState::default(),
        }
    }
}
