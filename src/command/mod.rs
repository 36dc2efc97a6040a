mod core;
mod types;

pub(crate) use core::{next_unit, prev_unit, reset_zoom, resize_viewport, zoom_in, zoom_out};
pub use types::{Command, CommandOutcome};
