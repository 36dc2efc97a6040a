mod factory;
mod file;
mod traits;

pub use factory::create_presenter;
pub use file::FilePresenter;
pub use traits::{PresenterKind, SurfacePresenter};
