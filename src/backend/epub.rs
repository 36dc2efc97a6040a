use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use epub::doc::EpubDoc;
use log::{debug, warn};

use crate::error::{AppError, AppResult};

use super::traits::{Chapter, ChapterSource};
use super::{calculate_doc_id, ensure_regular_file};

type Archive = EpubDoc<BufReader<File>>;

pub struct EpubBook {
    path: PathBuf,
    doc_id: u64,
    /// Spine order, as full paths inside the container.
    spine: Vec<PathBuf>,
    archive: Mutex<Archive>,
}

impl ChapterSource for EpubBook {
    fn path(&self) -> &Path {
        &self.path
    }

    fn doc_id(&self) -> u64 {
        self.doc_id
    }

    fn chapter_count(&self) -> usize {
        self.spine.len()
    }

    fn chapter(&self, index: usize) -> AppResult<Chapter> {
        EpubBook::chapter(self, index)
    }

    fn resource(&self, archive_path: &Path) -> Option<Vec<u8>> {
        self.lock_archive().ok()?.get_resource_by_path(archive_path)
    }
}

impl EpubBook {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        ensure_regular_file(path)?;

        let byte_len = std::fs::metadata(path)
            .map_err(|err| AppError::open(path, err.to_string()))?
            .len();
        let archive = EpubDoc::new(path)
            .map_err(|err| AppError::open(path, format!("failed to parse EPUB: {err}")))?;

        let spine = archive
            .spine
            .iter()
            .filter_map(|item| match archive.resources.get(&item.idref) {
                Some(resource) => Some(resource.path.clone()),
                None => {
                    warn!("spine entry {} has no manifest resource", item.idref);
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(
            "opened epub {} with {} spine entries",
            path.display(),
            spine.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            doc_id: calculate_doc_id(path, byte_len),
            spine,
            archive: Mutex::new(archive),
        })
    }

    pub fn chapter(&self, index: usize) -> AppResult<Chapter> {
        let chapter_path = self
            .spine
            .get(index)
            .ok_or(AppError::index_out_of_range(index, self.spine.len()))?;

        let bytes = self
            .lock_archive()?
            .get_resource_by_path(chapter_path)
            .ok_or_else(|| {
                AppError::render(
                    index,
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("missing chapter {}", chapter_path.display()),
                    ),
                )
            })?;

        Ok(Chapter {
            path: chapter_path.clone(),
            markup: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    fn lock_archive(&self) -> AppResult<MutexGuard<'_, Archive>> {
        self.archive
            .lock()
            .map_err(|_| AppError::unsupported("epub archive lock was poisoned"))
    }
}
