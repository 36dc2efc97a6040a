use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use crate::config::RenderConfig;
use crate::document::DocumentHandle;
use crate::error::{AppError, AppResult};

use super::renderer_for;
use super::surface::{RenderRequest, RenderedSurface};

enum RenderWorkerRequest {
    Render(RenderRequest),
    Shutdown,
}

/// Opens the worker's private copy of the document.
pub trait DocumentLoader: Send + Sync {
    fn open(&self, path: &Path) -> AppResult<DocumentHandle>;
}

#[derive(Debug, Default)]
pub struct DefaultDocumentLoader;

impl DocumentLoader for DefaultDocumentLoader {
    fn open(&self, path: &Path) -> AppResult<DocumentHandle> {
        DocumentHandle::open(path)
    }
}

#[derive(Debug)]
pub struct RenderCompletion {
    pub request: RenderRequest,
    pub result: AppResult<RenderedSurface>,
    pub elapsed: Duration,
}

/// Renders off the input timeline. Requests queued behind a newer one are
/// skipped without a completion. The result channel closes if the worker
/// cannot open its document or its renderer panics.
pub struct RenderWorker {
    request_tx: UnboundedSender<RenderWorkerRequest>,
    result_rx: UnboundedReceiver<RenderCompletion>,
    _runtime: RenderWorkerRuntime,
    worker: Option<JoinHandle<()>>,
}

struct RenderWorkerRuntime {
    _owned: Option<Runtime>,
    handle: Handle,
}

impl RenderWorkerRuntime {
    fn new() -> AppResult<Self> {
        if let Ok(handle) = Handle::try_current() {
            return Ok(Self {
                _owned: None,
                handle,
            });
        }

        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("pvd-render")
            .build()
            .map_err(|err| AppError::io_with_context(err, "failed to start render runtime"))?;
        let handle = runtime.handle().clone();
        Ok(Self {
            _owned: Some(runtime),
            handle,
        })
    }

    fn spawn_blocking<F>(&self, task: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.spawn_blocking(task)
    }
}

impl RenderWorker {
    pub fn spawn(path: PathBuf, config: RenderConfig) -> AppResult<Self> {
        Self::spawn_with_loader(path, config, Arc::new(DefaultDocumentLoader))
    }

    pub fn spawn_with_loader(
        path: PathBuf,
        config: RenderConfig,
        loader: Arc<dyn DocumentLoader>,
    ) -> AppResult<Self> {
        let (request_tx, request_rx) = unbounded_channel();
        let (result_tx, result_rx) = unbounded_channel();
        let runtime = RenderWorkerRuntime::new()?;
        let worker = runtime.spawn_blocking(move || {
            render_worker_main(path, config, loader, request_rx, result_tx)
        });

        Ok(Self {
            request_tx,
            result_rx,
            _runtime: runtime,
            worker: Some(worker),
        })
    }

    pub fn submit(&self, request: RenderRequest) -> AppResult<()> {
        self.request_tx
            .send(RenderWorkerRequest::Render(request))
            .map_err(|_| AppError::unsupported("render worker has stopped"))
    }

    pub async fn recv(&mut self) -> Option<RenderCompletion> {
        self.result_rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RenderCompletion> {
        self.result_rx.try_recv().ok()
    }

    fn shutdown(&mut self) {
        let _ = self.request_tx.send(RenderWorkerRequest::Shutdown);
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn render_worker_main(
    path: PathBuf,
    config: RenderConfig,
    loader: Arc<dyn DocumentLoader>,
    mut request_rx: UnboundedReceiver<RenderWorkerRequest>,
    result_tx: UnboundedSender<RenderCompletion>,
) {
    let opened = loader.open(&path).and_then(|doc| {
        let renderer = renderer_for(&doc, &config)?;
        Ok((doc, renderer))
    });
    let (doc, mut renderer) = match opened {
        Ok(opened) => opened,
        Err(err) => {
            warn!("render worker could not open {}: {err}", path.display());
            request_rx.close();
            return;
        }
    };

    while let Some(request) = request_rx.blocking_recv() {
        let RenderWorkerRequest::Render(mut request) = request else {
            break;
        };

        let mut skipped = 0usize;
        loop {
            match request_rx.try_recv() {
                Ok(RenderWorkerRequest::Render(newer)) => {
                    request = newer;
                    skipped += 1;
                }
                Ok(RenderWorkerRequest::Shutdown) => return,
                Err(_) => break,
            }
        }
        if skipped > 0 {
            debug!("render worker skipped {skipped} superseded request(s)");
        }

        let started = Instant::now();
        let result = renderer.render(&doc, &request);
        let completion = RenderCompletion {
            request,
            result,
            elapsed: started.elapsed(),
        };
        if result_tx.send(completion).is_err() {
            break;
        }
    }
}
