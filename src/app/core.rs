use std::path::Path;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::command::{
    Command, CommandOutcome, next_unit, prev_unit, reset_zoom, resize_viewport, zoom_in, zoom_out,
};
use crate::config::{Config, ZoomConfig};
use crate::document::DocumentHandle;
use crate::error::{AppError, AppResult};
use crate::perf::RenderStats;
use crate::render::worker::RenderCompletion;
use crate::render::{
    RenderRequest, RenderedSurface, UnitRenderer, Viewport, centered_origin, renderer_for,
};

use super::state::{ViewerPhase, ViewerState};

/// Result of applying one command to the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub outcome: CommandOutcome,
    /// Render to dispatch, already snapshotted.
    pub request: Option<RenderRequest>,
    /// The displayed surface moved without a new render and should be
    /// presented again.
    pub recentered: bool,
}

#[derive(Debug)]
pub enum Completion {
    /// The surface now on display changed.
    Presented,
    /// A newer request was issued after this one; the result was dropped.
    Stale,
    /// The request named a unit outside the document. Nothing changed.
    Skipped,
    /// The unit failed to render. The previous surface stays on display.
    Failed(AppError),
}

#[derive(Debug)]
pub struct EventOutcome {
    pub outcome: CommandOutcome,
    pub completion: Option<Completion>,
}

/// Owns a document, its renderer and the navigation state. All transitions
/// and render dispatches for one document run on one timeline.
pub struct ViewerController {
    document: DocumentHandle,
    renderer: Box<dyn UnitRenderer>,
    state: ViewerState,
    phase: ViewerPhase,
    zoom: ZoomConfig,
    generation: u64,
    pending: Option<RenderRequest>,
    surface: Option<RenderedSurface>,
    stats: RenderStats,
}

impl ViewerController {
    pub fn open(path: impl AsRef<Path>, viewport: Viewport, config: &Config) -> AppResult<Self> {
        let document = DocumentHandle::open(path)?;
        Self::new(document, viewport, config)
    }

    pub fn new(document: DocumentHandle, viewport: Viewport, config: &Config) -> AppResult<Self> {
        let renderer = renderer_for(&document, &config.render)?;
        Ok(Self::with_renderer(
            document,
            renderer,
            viewport,
            config.zoom.clone(),
        ))
    }

    pub fn with_renderer(
        document: DocumentHandle,
        renderer: Box<dyn UnitRenderer>,
        viewport: Viewport,
        zoom: ZoomConfig,
    ) -> Self {
        let phase = if document.unit_count() == 0 {
            ViewerPhase::Empty
        } else {
            ViewerPhase::Ready
        };
        info!(
            "viewer ready: {} {}(s), renderer {}, phase {phase:?}",
            document.unit_count(),
            document.variant().unit_label(),
            renderer.name()
        );

        Self {
            document,
            renderer,
            state: ViewerState::new(viewport),
            phase,
            zoom,
            generation: 0,
            pending: None,
            surface: None,
            stats: RenderStats::default(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn phase(&self) -> ViewerPhase {
        self.phase
    }

    pub fn document(&self) -> &DocumentHandle {
        &self.document
    }

    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    /// The surface currently on display.
    pub fn surface(&self) -> Option<&RenderedSurface> {
        self.surface.as_ref()
    }

    /// The most recently issued request, until it completes.
    pub fn pending(&self) -> Option<&RenderRequest> {
        self.pending.as_ref()
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Snapshots the current state into a new request. Any request issued
    /// before it becomes stale.
    pub fn request_current(&mut self) -> Option<RenderRequest> {
        if self.phase == ViewerPhase::Empty {
            return None;
        }

        self.generation += 1;
        let unit = self.state.current_index;
        let scale = self.renderer.resolve_scale(
            &self.document,
            unit,
            self.state.viewport,
            self.state.zoom_factor,
        );
        let request = RenderRequest {
            generation: self.generation,
            unit,
            zoom: self.state.zoom_factor,
            viewport: self.state.viewport,
            scale,
        };
        self.pending = Some(request);
        Some(request)
    }

    pub fn apply(&mut self, command: Command) -> Transition {
        let unit_count = self.document.unit_count();
        let outcome = match command {
            Command::NextUnit => next_unit(&mut self.state, unit_count),
            Command::PreviousUnit => prev_unit(&mut self.state, unit_count),
            Command::ZoomIn | Command::ZoomOut | Command::ResetZoom
                if !self.renderer.supports_zoom() =>
            {
                self.state.status.last_command = Some(command);
                self.state.status.message = format!(
                    "zoom is not available for {}s",
                    self.document.variant().unit_label()
                );
                CommandOutcome::Noop
            }
            Command::ZoomIn => zoom_in(&mut self.state, &self.zoom),
            Command::ZoomOut => zoom_out(&mut self.state, &self.zoom),
            Command::ResetZoom => reset_zoom(&mut self.state),
            Command::ViewportResized { width, height } => {
                resize_viewport(&mut self.state, Viewport::new(width, height))
            }
        };

        let rerender = match command {
            _ if !outcome.is_applied() => false,
            Command::ViewportResized { .. } => self.renderer.rescales_on_resize(),
            _ => true,
        };
        let request = if rerender {
            self.request_current()
        } else {
            None
        };
        // Without a rescale only the placement follows the new viewport.
        let recentered = request.is_none()
            && outcome.is_applied()
            && matches!(command, Command::ViewportResized { .. })
            && self.recenter_surface();
        debug!(
            "{} -> {outcome:?} (unit {}, zoom {:.3}, request {:?})",
            command.as_str(),
            self.state.current_index,
            self.state.zoom_factor,
            request.map(|request| request.generation)
        );

        Transition {
            outcome,
            request,
            recentered,
        }
    }

    /// Renders synchronously on the caller's timeline.
    pub fn render(&mut self, request: &RenderRequest) -> RenderCompletion {
        let started = Instant::now();
        let result = self.renderer.render(&self.document, request);
        RenderCompletion {
            request: *request,
            result,
            elapsed: started.elapsed(),
        }
    }

    /// Applies a finished render. Only the latest request may replace the
    /// displayed surface; failures are logged and contained here.
    pub fn complete(&mut self, completion: RenderCompletion) -> Completion {
        let RenderCompletion {
            request,
            result,
            elapsed,
        } = completion;
        if request.generation != self.generation {
            self.stats.record_discarded();
            debug!(
                "discarded stale render of unit {} (generation {}, current {})",
                request.unit, request.generation, self.generation
            );
            return Completion::Stale;
        }
        self.pending = None;

        match result {
            Ok(surface) => {
                self.stats.record_render(elapsed);
                self.surface = Some(surface);
                // The viewport may have moved on while a fixed-scale render ran.
                self.recenter_surface();
                Completion::Presented
            }
            Err(err @ AppError::IndexOutOfRange { .. }) => {
                warn!("ignored render request: {err}");
                Completion::Skipped
            }
            Err(err) => {
                self.stats.record_failure();
                let label = self.document.variant().unit_label();
                if err.is_recoverable() {
                    warn!("failed to render {label} {}: {err}", request.unit + 1);
                } else {
                    error!("renderer failed on {label} {}: {err}", request.unit + 1);
                }
                self.state.status.message = match &err {
                    AppError::Render { .. } => err.to_string(),
                    _ => format!("render failed: {err}"),
                };
                Completion::Failed(err)
            }
        }
    }

    /// Centers a displayed raster surface in the current viewport. Returns
    /// whether its origin moved.
    fn recenter_surface(&mut self) -> bool {
        let viewport = self.state.viewport;
        let Some(RenderedSurface::Raster { frame, origin, .. }) = self.surface.as_mut() else {
            return false;
        };
        let centered = centered_origin(frame.width, frame.height, viewport);
        let moved = *origin != centered;
        *origin = centered;
        moved
    }

    /// Renders the current unit and puts it on display.
    pub fn refresh(&mut self) -> Option<Completion> {
        let request = self.request_current()?;
        let completion = self.render(&request);
        Some(self.complete(completion))
    }

    /// Applies a command and renders synchronously if it calls for it.
    pub fn handle(&mut self, command: Command) -> EventOutcome {
        let transition = self.apply(command);
        let completion = transition.request.map(|request| {
            let completion = self.render(&request);
            self.complete(completion)
        });
        EventOutcome {
            outcome: transition.outcome,
            completion,
        }
    }
}
