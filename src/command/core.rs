use crate::app::ViewerState;
use crate::config::ZoomConfig;
use crate::render::{Viewport, scale_eq};

use super::types::{Command, CommandOutcome};

pub(crate) fn next_unit(state: &mut ViewerState, unit_count: usize) -> CommandOutcome {
    state.status.last_command = Some(Command::NextUnit);
    if unit_count == 0 {
        state.status.message = "document is empty".to_string();
        return CommandOutcome::Noop;
    }

    if state.current_index + 1 >= unit_count {
        state.status.message = format!(
            "already at last unit ({}/{unit_count})",
            state.current_index + 1
        );
        return CommandOutcome::Noop;
    }

    state.current_index += 1;
    state.status.message = format!("{}/{unit_count}", state.current_index + 1);
    CommandOutcome::Applied
}

pub(crate) fn prev_unit(state: &mut ViewerState, unit_count: usize) -> CommandOutcome {
    state.status.last_command = Some(Command::PreviousUnit);
    if unit_count == 0 {
        state.status.message = "document is empty".to_string();
        return CommandOutcome::Noop;
    }

    if state.current_index == 0 {
        state.status.message = "already at first unit (1)".to_string();
        return CommandOutcome::Noop;
    }

    state.current_index -= 1;
    state.status.message = format!("{}/{unit_count}", state.current_index + 1);
    CommandOutcome::Applied
}

pub(crate) fn zoom_in(state: &mut ViewerState, zoom: &ZoomConfig) -> CommandOutcome {
    state.status.last_command = Some(Command::ZoomIn);
    set_zoom(state, (state.zoom_factor * zoom.step).min(zoom.max))
}

pub(crate) fn zoom_out(state: &mut ViewerState, zoom: &ZoomConfig) -> CommandOutcome {
    state.status.last_command = Some(Command::ZoomOut);
    set_zoom(state, (state.zoom_factor / zoom.step).max(zoom.min))
}

/// Always lands on exactly 1.0.
pub(crate) fn reset_zoom(state: &mut ViewerState) -> CommandOutcome {
    state.status.last_command = Some(Command::ResetZoom);
    if state.zoom_factor == 1.0 {
        state.status.message = "zoom unchanged (1.00x)".to_string();
        return CommandOutcome::Noop;
    }

    state.zoom_factor = 1.0;
    state.status.message = "zoom 1.00x".to_string();
    CommandOutcome::Applied
}

pub(crate) fn resize_viewport(state: &mut ViewerState, viewport: Viewport) -> CommandOutcome {
    state.status.last_command = Some(Command::ViewportResized {
        width: viewport.width,
        height: viewport.height,
    });
    if state.viewport == viewport {
        return CommandOutcome::Noop;
    }

    state.viewport = viewport;
    CommandOutcome::Applied
}

fn set_zoom(state: &mut ViewerState, target: f32) -> CommandOutcome {
    if scale_eq(state.zoom_factor, target) {
        state.status.message = format!("zoom unchanged ({:.2}x)", state.zoom_factor);
        return CommandOutcome::Noop;
    }

    state.zoom_factor = target;
    state.status.message = format!("zoom {:.2}x", state.zoom_factor);
    CommandOutcome::Applied
}

#[cfg(test)]
mod tests {
    use crate::app::ViewerState;
    use crate::command::{Command, CommandOutcome};
    use crate::config::ZoomConfig;
    use crate::render::Viewport;

    use super::{next_unit, prev_unit, reset_zoom, resize_viewport, zoom_in, zoom_out};

    fn state() -> ViewerState {
        ViewerState::new(Viewport::new(800, 600))
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut state = state();
        assert_eq!(prev_unit(&mut state, 3), CommandOutcome::Noop);
        assert_eq!(next_unit(&mut state, 3), CommandOutcome::Applied);
        assert_eq!(next_unit(&mut state, 3), CommandOutcome::Applied);
        assert_eq!(next_unit(&mut state, 3), CommandOutcome::Noop);
        assert_eq!(state.current_index, 2);
        assert_eq!(state.status.message, "already at last unit (3/3)");
        assert_eq!(state.status.last_command, Some(Command::NextUnit));
    }

    #[test]
    fn navigation_on_empty_document_is_noop() {
        let mut state = state();
        assert_eq!(next_unit(&mut state, 0), CommandOutcome::Noop);
        assert_eq!(prev_unit(&mut state, 0), CommandOutcome::Noop);
        assert_eq!(state.current_index, 0);
    }

    #[test]
    fn zoom_is_bounded_and_noop_at_bounds() {
        let zoom = ZoomConfig::default();
        let mut state = state();
        for _ in 0..40 {
            zoom_in(&mut state, &zoom);
        }
        assert_eq!(state.zoom_factor, 10.0);
        assert_eq!(zoom_in(&mut state, &zoom), CommandOutcome::Noop);

        for _ in 0..80 {
            zoom_out(&mut state, &zoom);
        }
        assert_eq!(state.zoom_factor, 0.1);
        assert_eq!(zoom_out(&mut state, &zoom), CommandOutcome::Noop);
    }

    #[test]
    fn reset_zoom_is_exact() {
        let zoom = ZoomConfig::default();
        let mut state = state();
        zoom_in(&mut state, &zoom);
        zoom_in(&mut state, &zoom);
        zoom_out(&mut state, &zoom);
        assert_eq!(reset_zoom(&mut state), CommandOutcome::Applied);
        assert_eq!(state.zoom_factor, 1.0);
        assert_eq!(reset_zoom(&mut state), CommandOutcome::Noop);
    }

    #[test]
    fn resize_reports_only_real_changes() {
        let mut state = state();
        assert_eq!(
            resize_viewport(&mut state, Viewport::new(800, 600)),
            CommandOutcome::Noop
        );
        assert_eq!(
            resize_viewport(&mut state, Viewport::new(1024, 768)),
            CommandOutcome::Applied
        );
        assert_eq!(state.viewport, Viewport::new(1024, 768));
    }
}
