use std::path::PathBuf;

use super::file::FilePresenter;
use super::traits::{PresenterKind, SurfacePresenter};

pub fn create_presenter(kind: PresenterKind, out: PathBuf) -> Box<dyn SurfacePresenter> {
    match kind {
        PresenterKind::File => Box::new(FilePresenter::new(out)),
    }
}
