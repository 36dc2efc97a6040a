use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::StubPdf;
use crate::app::{Completion, ViewerController};
use crate::backend::{RasterBackend, RgbFrame};
use crate::command::Command;
use crate::config::{Config, RenderConfig};
use crate::document::DocumentHandle;
use crate::error::{AppError, AppResult};
use crate::render::Viewport;
use crate::render::worker::{DocumentLoader, RenderWorker};

struct StubLoader {
    pages: usize,
}

impl DocumentLoader for StubLoader {
    fn open(&self, _path: &Path) -> AppResult<DocumentHandle> {
        Ok(DocumentHandle::Raster(Box::new(StubPdf::new(self.pages))))
    }
}

struct FailingLoader;

impl DocumentLoader for FailingLoader {
    fn open(&self, path: &Path) -> AppResult<DocumentHandle> {
        Err(AppError::open(path, "file not found"))
    }
}

/// Blocks every render until the test releases it, reporting when it starts.
struct GatedPdf {
    path: PathBuf,
    started: Mutex<Sender<usize>>,
    release: Mutex<Receiver<()>>,
}

impl RasterBackend for GatedPdf {
    fn path(&self) -> &Path {
        &self.path
    }

    fn doc_id(&self) -> u64 {
        9
    }

    fn page_count(&self) -> usize {
        4
    }

    fn page_dimensions(&self, _page: usize) -> AppResult<(f32, f32)> {
        Ok((100.0, 100.0))
    }

    fn render_page(&self, page: usize, _scale: f32) -> AppResult<RgbFrame> {
        if let Ok(started) = self.started.lock() {
            let _ = started.send(page);
        }
        if let Ok(release) = self.release.lock() {
            let _ = release.recv_timeout(Duration::from_secs(5));
        }
        Ok(RgbFrame {
            width: 1,
            height: 1,
            pixels: vec![0; 3].into(),
        })
    }
}

struct GatedLoader {
    backend: Mutex<Option<GatedPdf>>,
}

impl DocumentLoader for GatedLoader {
    fn open(&self, path: &Path) -> AppResult<DocumentHandle> {
        let backend = self
            .backend
            .lock()
            .ok()
            .and_then(|mut backend| backend.take())
            .ok_or_else(|| AppError::open(path, "already opened"))?;
        Ok(DocumentHandle::Raster(Box::new(backend)))
    }
}

fn controller(pages: usize) -> ViewerController {
    ViewerController::new(
        DocumentHandle::Raster(Box::new(StubPdf::new(pages))),
        Viewport::new(400, 400),
        &Config::default(),
    )
    .expect("controller should build")
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_renders_requests_from_the_controller() {
    let mut controller = controller(3);
    let mut worker = RenderWorker::spawn_with_loader(
        PathBuf::from("stub.pdf"),
        RenderConfig::default(),
        Arc::new(StubLoader { pages: 3 }),
    )
    .expect("worker should spawn");

    let request = controller
        .apply(Command::NextUnit)
        .request
        .expect("navigation should request a render");
    worker.submit(request).expect("worker should accept request");

    let completion = worker.recv().await.expect("worker should answer");
    assert_eq!(completion.request, request);
    assert!(matches!(controller.complete(completion), Completion::Presented));
    assert_eq!(controller.surface().map(|surface| surface.unit()), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_skips_requests_queued_behind_newer_ones() {
    let (started_tx, started_rx) = channel();
    let (release_tx, release_rx) = channel();
    let loader = GatedLoader {
        backend: Mutex::new(Some(GatedPdf {
            path: PathBuf::from("gated.pdf"),
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        })),
    };
    let mut controller = ViewerController::new(
        DocumentHandle::Raster(Box::new(StubPdf::new(4))),
        Viewport::new(100, 100),
        &Config::default(),
    )
    .expect("controller should build");
    let mut worker = RenderWorker::spawn_with_loader(
        PathBuf::from("gated.pdf"),
        RenderConfig::default(),
        Arc::new(loader),
    )
    .expect("worker should spawn");

    let first = controller.apply(Command::NextUnit).request.expect("request");
    worker.submit(first).expect("submit first");
    let page = started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first render should start");
    assert_eq!(page, 1);

    let second = controller.apply(Command::NextUnit).request.expect("request");
    let third = controller.apply(Command::NextUnit).request.expect("request");
    worker.submit(second).expect("submit second");
    worker.submit(third).expect("submit third");
    release_tx.send(()).expect("release first");
    release_tx.send(()).expect("release third");

    let done = worker.recv().await.expect("first completion");
    assert_eq!(done.request.generation, first.generation);
    assert!(matches!(controller.complete(done), Completion::Stale));

    let done = worker.recv().await.expect("latest completion");
    assert_eq!(done.request.generation, third.generation);
    assert!(matches!(controller.complete(done), Completion::Presented));
    assert_eq!(controller.surface().map(|surface| surface.unit()), Some(3));
    assert!(worker.try_recv().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_closes_when_document_cannot_open() {
    let mut controller = controller(2);
    let mut worker = RenderWorker::spawn_with_loader(
        PathBuf::from("missing.pdf"),
        RenderConfig::default(),
        Arc::new(FailingLoader),
    )
    .expect("worker should spawn");

    assert!(worker.recv().await.is_none());
    let request = controller.request_current().expect("ready controller requests");
    assert!(matches!(
        worker.submit(request),
        Err(AppError::Unsupported(_))
    ));
}

#[test]
fn worker_owns_a_runtime_outside_tokio() {
    let worker = RenderWorker::spawn_with_loader(
        PathBuf::from("stub.pdf"),
        RenderConfig::default(),
        Arc::new(StubLoader { pages: 1 }),
    );
    assert!(worker.is_ok());
}
