mod keymap;

pub use keymap::{HostAction, map_event, map_key};
