/// Discrete viewer events delivered serially by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextUnit,
    PreviousUnit,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ViewportResized { width: u32, height: u32 },
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NextUnit => "next-unit",
            Self::PreviousUnit => "previous-unit",
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
            Self::ResetZoom => "reset-zoom",
            Self::ViewportResized { .. } => "viewport-resized",
        }
    }

    pub fn is_zoom(self) -> bool {
        matches!(self, Self::ZoomIn | Self::ZoomOut | Self::ResetZoom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    Noop,
}

impl CommandOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}
