//! Directory listing for the wallpaper folder.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

const SUPPORTED_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Shape of the display area; picks which auxiliary subfolder joins the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Taller than wide is portrait; square counts as landscape.
    pub fn for_size(width: u32, height: u32) -> Self {
        if height > width {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }

    pub fn subdir_name(self) -> &'static str {
        match self {
            Self::Portrait => "Portrait",
            Self::Landscape => "Landscape",
        }
    }
}

/// Source of candidate image paths.
pub trait ImageSource {
    /// Rebuild the ordered candidate set for `orientation`.
    ///
    /// # Errors
    /// Returns [`Error::DirectoryUnavailable`] when the base directory cannot be read.
    fn list_images(&self, orientation: Orientation) -> Result<Vec<PathBuf>, Error>;
}

/// Lists a wallpaper folder (non-recursively) plus its orientation subfolder.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageSource for DirectoryLibrary {
    fn list_images(&self, orientation: Orientation) -> Result<Vec<PathBuf>, Error> {
        if !self.root.is_dir() {
            return Err(Error::DirectoryUnavailable(self.root.clone()));
        }
        let mut images = list_dir(&self.root);

        let aux = self.root.join(orientation.subdir_name());
        if aux.is_dir() {
            let extra = list_dir(&aux);
            debug!(dir = %aux.display(), count = extra.len(), "auxiliary images");
            images.extend(extra);
        }
        Ok(images)
    }
}

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTS.iter().any(|e| *e == ext)
        })
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .flatten()
        .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
        .map(DirEntry::into_path)
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
