use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use log::{info, warn};

use crate::command::Command;
use crate::config::HostConfig;
use crate::error::AppResult;
use crate::input::{HostAction, map_event};
use crate::presenter::SurfacePresenter;
use crate::render::RenderRequest;
use crate::render::worker::{RenderCompletion, RenderWorker};

use super::core::{Completion, ViewerController};
use super::terminal_session::{TerminalSession, TerminalSurface, terminal_viewport};

const HELP_LINE: &str = "space/j next  backspace/k prev  +/- zoom  0 reset  q quit";

enum WaitEvent {
    Input(Event),
    InputError(String),
    Render(RenderCompletion),
    WorkerStopped,
    Closed,
}

enum LoopControl {
    Continue,
    Break,
}

/// Terminal front end: feeds key and resize events to the controller and
/// hands finished surfaces to the presenter.
pub struct ViewerHost {
    controller: ViewerController,
    presenter: Box<dyn SurfacePresenter>,
    worker: Option<RenderWorker>,
    cell_px: (u16, u16),
    follow_terminal: bool,
    presented: String,
    needs_redraw: bool,
}

impl ViewerHost {
    pub fn new(
        controller: ViewerController,
        presenter: Box<dyn SurfacePresenter>,
        worker: Option<RenderWorker>,
        host: &HostConfig,
    ) -> Self {
        Self {
            controller,
            presenter,
            worker,
            cell_px: host.cell_px,
            follow_terminal: true,
            presented: String::new(),
            needs_redraw: true,
        }
    }

    /// Keeps the viewport given at construction instead of tracking the terminal.
    pub fn with_fixed_viewport(mut self) -> Self {
        self.follow_terminal = false;
        self
    }

    pub fn controller(&self) -> &ViewerController {
        &self.controller
    }

    /// Whether renders still go to the background worker.
    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Last line reported by the presenter.
    pub fn presented(&self) -> &str {
        &self.presented
    }

    pub async fn run(&mut self) -> AppResult<()> {
        let mut session = TerminalSession::enter()?;
        if self.follow_terminal {
            let (columns, rows) = session.size()?;
            let viewport = terminal_viewport(columns, rows, self.cell_px);
            // The first render below covers the new geometry.
            let _ = self.controller.apply(Command::ViewportResized {
                width: viewport.width,
                height: viewport.height,
            });
        }
        self.start();

        let mut input = EventStream::new();
        loop {
            if self.needs_redraw {
                session.show_status(&self.status_lines())?;
                self.needs_redraw = false;
            }

            let waited = wait_next_event(&mut input, self.worker.as_mut()).await;
            if matches!(self.handle_waited_event(waited), LoopControl::Break) {
                break;
            }
        }

        session.restore()?;
        info!("viewer closed");
        Ok(())
    }

    /// Dispatches the first render of the current unit.
    pub fn start(&mut self) {
        let initial = self.controller.request_current();
        self.dispatch(initial);
    }

    /// Applies a command and dispatches the render it asks for.
    pub fn apply(&mut self, command: Command) {
        let transition = self.controller.apply(command);
        self.needs_redraw = true;
        if transition.recentered {
            self.present_current();
        }
        self.dispatch(transition.request);
    }

    /// Sends `request` to the worker, or renders inline without one.
    pub fn dispatch(&mut self, request: Option<RenderRequest>) {
        let Some(request) = request else {
            return;
        };
        if let Some(worker) = self.worker.as_ref() {
            match worker.submit(request) {
                Ok(()) => return,
                Err(err) => {
                    warn!("{err}; rendering on the input timeline");
                    self.worker = None;
                }
            }
        }
        let completion = self.controller.render(&request);
        self.accept(completion);
    }

    pub fn accept(&mut self, completion: RenderCompletion) {
        match self.controller.complete(completion) {
            Completion::Presented => self.present_current(),
            Completion::Failed(_) => self.needs_redraw = true,
            Completion::Stale | Completion::Skipped => {}
        }
    }

    fn present_current(&mut self) {
        let Some(surface) = self.controller.surface() else {
            return;
        };
        match self.presenter.present(surface) {
            Ok(line) => self.presented = line,
            Err(err) => {
                warn!("{} presenter failed: {err}", self.presenter.name());
                self.presented = format!("present failed: {err}");
            }
        }
        self.needs_redraw = true;
    }

    /// Drops a worker whose result channel closed and renders the request it
    /// still owed on the input timeline.
    fn worker_stopped(&mut self) {
        if self.worker.take().is_none() {
            return;
        }
        warn!("render worker stopped; rendering on the input timeline");
        let pending = self.controller.pending().copied();
        self.dispatch(pending);
        self.needs_redraw = true;
    }

    /// Waits for the worker's next answer and applies it.
    #[cfg(test)]
    pub(crate) async fn wait_render(&mut self) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        match worker.recv().await {
            Some(completion) => self.accept(completion),
            None => self.worker_stopped(),
        }
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        let viewport = terminal_viewport(columns, rows, self.cell_px);
        self.apply(Command::ViewportResized {
            width: viewport.width,
            height: viewport.height,
        });
    }

    fn handle_waited_event(&mut self, waited: WaitEvent) -> LoopControl {
        match waited {
            WaitEvent::Input(event) => match map_event(&event) {
                Some(HostAction::Quit) => return LoopControl::Break,
                Some(HostAction::Command(command)) => self.apply(command),
                Some(HostAction::Resize { columns, rows }) => {
                    if self.follow_terminal {
                        self.resize(columns, rows);
                    }
                }
                None => {}
            },
            WaitEvent::InputError(message) => {
                warn!("input error: {message}");
                self.presented = format!("input error: {message}");
                self.needs_redraw = true;
            }
            WaitEvent::Render(completion) => self.accept(completion),
            WaitEvent::WorkerStopped => self.worker_stopped(),
            WaitEvent::Closed => return LoopControl::Break,
        }
        LoopControl::Continue
    }

    fn status_lines(&self) -> Vec<String> {
        let state = self.controller.state();
        let document = self.controller.document();
        let position = if document.unit_count() == 0 {
            format!("{} (empty)", document.path().display())
        } else {
            format!(
                "{} {} {}/{}  zoom {:.2}x  {}x{}px  {}",
                document.path().display(),
                document.variant().unit_label(),
                state.current_index + 1,
                document.unit_count(),
                state.zoom_factor,
                state.viewport.width,
                state.viewport.height,
                if self.has_worker() { "worker" } else { "inline" }
            )
        };
        vec![
            position,
            self.presented.clone(),
            state.status.message.clone(),
            HELP_LINE.to_string(),
        ]
    }
}

async fn wait_next_event(input: &mut EventStream, worker: Option<&mut RenderWorker>) -> WaitEvent {
    let render = async {
        match worker {
            Some(worker) => worker.recv().await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        biased;
        maybe_input = input.next() => {
            match maybe_input {
                Some(Ok(event)) => WaitEvent::Input(event),
                Some(Err(err)) => WaitEvent::InputError(err.to_string()),
                None => WaitEvent::Closed,
            }
        },
        maybe_render = render => {
            match maybe_render {
                Some(completion) => WaitEvent::Render(completion),
                None => WaitEvent::WorkerStopped,
            }
        },
    }
}
