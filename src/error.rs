use std::path::{Path, PathBuf};

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("cannot open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },
    #[error("unit {index} is out of range (document has {count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("render failed for unit {}: {source}", .unit + 1)]
    Render {
        unit: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("malformed markup: {0}")]
    Markup(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl AppError {
    pub fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    pub fn open(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn index_out_of_range(index: usize, count: usize) -> Self {
        Self::IndexOutOfRange { index, count }
    }

    pub fn render(unit: usize, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Render {
            unit,
            source: Box::new(source),
        }
    }

    pub fn markup(message: impl Into<String>) -> Self {
        Self::Markup(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Errors that a controller contains without ending the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::Render { .. } | Self::Markup(_)
        )
    }
}
