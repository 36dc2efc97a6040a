//! Document abstraction over the two supported content models.

use std::path::Path;

use log::info;

use crate::backend::{
    Chapter, ChapterSource, RasterBackend, open_default_chapters, open_default_raster,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentVariant {
    /// Fixed-layout pages rendered to pixels.
    Raster,
    /// Markup chapters laid out by a paint engine.
    Reflowable,
}

impl DocumentVariant {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Raster),
            "epub" => Some(Self::Reflowable),
            _ => None,
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Self::Raster => "page",
            Self::Reflowable => "chapter",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Page { width: f32, height: f32 },
    Chapter(Chapter),
}

/// An opened document. Owns the decoded source exclusively and releases it on drop.
pub enum DocumentHandle {
    Raster(Box<dyn RasterBackend>),
    Reflowable(Box<dyn ChapterSource>),
}

impl DocumentHandle {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let variant = DocumentVariant::from_path(path)
            .ok_or_else(|| AppError::open(path, "unsupported document format"))?;

        let handle = match variant {
            DocumentVariant::Raster => Self::Raster(open_default_raster(path)?),
            DocumentVariant::Reflowable => Self::Reflowable(open_default_chapters(path)?),
        };
        info!(
            "opened {} with {} {}(s)",
            path.display(),
            handle.unit_count(),
            variant.unit_label()
        );
        Ok(handle)
    }

    pub fn variant(&self) -> DocumentVariant {
        match self {
            Self::Raster(_) => DocumentVariant::Raster,
            Self::Reflowable(_) => DocumentVariant::Reflowable,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Raster(doc) => doc.path(),
            Self::Reflowable(doc) => doc.path(),
        }
    }

    pub fn doc_id(&self) -> u64 {
        match self {
            Self::Raster(doc) => doc.doc_id(),
            Self::Reflowable(doc) => doc.doc_id(),
        }
    }

    pub fn unit_count(&self) -> usize {
        match self {
            Self::Raster(doc) => doc.page_count(),
            Self::Reflowable(doc) => doc.chapter_count(),
        }
    }

    /// Content size in points for pages; reflowable chapters have none.
    pub fn intrinsic_size(&self, index: usize) -> AppResult<Option<(f32, f32)>> {
        self.ensure_in_range(index)?;
        match self {
            Self::Raster(doc) => doc.page_dimensions(index).map(Some),
            Self::Reflowable(_) => Ok(None),
        }
    }

    pub fn get_fragment(&self, index: usize) -> AppResult<Fragment> {
        self.ensure_in_range(index)?;
        match self {
            Self::Raster(doc) => {
                let (width, height) = doc.page_dimensions(index)?;
                Ok(Fragment::Page { width, height })
            }
            Self::Reflowable(doc) => doc.chapter(index).map(Fragment::Chapter),
        }
    }

    pub fn raster(&self) -> Option<&dyn RasterBackend> {
        match self {
            Self::Raster(doc) => Some(doc.as_ref()),
            Self::Reflowable(_) => None,
        }
    }

    pub fn chapters(&self) -> Option<&dyn ChapterSource> {
        match self {
            Self::Raster(_) => None,
            Self::Reflowable(doc) => Some(doc.as_ref()),
        }
    }

    fn ensure_in_range(&self, index: usize) -> AppResult<()> {
        let count = self.unit_count();
        if index >= count {
            return Err(AppError::index_out_of_range(index, count));
        }
        Ok(())
    }
}
