mod core;
mod event_loop;
mod state;
pub(crate) mod terminal_session;

#[cfg(test)]
mod tests;

pub use core::{Completion, EventOutcome, Transition, ViewerController};
pub use event_loop::ViewerHost;
pub use state::{StatusState, ViewerPhase, ViewerState};
