use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use walkdir::WalkDir;

use super::byte_source::{ByteSource, LocalFileSource};

/// One file from a folder selection.
///
/// `relative_path` is relative to the parent of the selected folder, so it
/// starts with the folder's own name (`image_files/0/0_0.jpg`), the way a
/// browser folder picker reports it. Separators are not normalized here.
#[derive(Clone)]
pub struct SelectedFile {
    pub relative_path: String,
    pub source: Arc<dyn ByteSource>,
}

impl SelectedFile {
    pub fn new(relative_path: impl Into<String>, source: Arc<dyn ByteSource>) -> Self {
        Self {
            relative_path: relative_path.into(),
            source,
        }
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("relative_path", &self.relative_path)
            .field("source", &self.source.identifier())
            .finish()
    }
}

/// An unordered batch of selected files.
///
/// The selection is only enumerated when [`FileSelection::files`] is called,
/// so a load that fails on its descriptor never touches the tiles.
pub trait FileSelection: Send + Sync {
    fn files(&self) -> Vec<SelectedFile>;
}

impl FileSelection for Vec<SelectedFile> {
    fn files(&self) -> Vec<SelectedFile> {
        self.clone()
    }
}

/// Selection of every regular file below a local folder.
///
/// Paths are reported relative to the folder's parent. Unreadable entries are
/// skipped with a warning rather than failing the whole selection.
#[derive(Debug, Clone)]
pub struct DirectorySelection {
    dir: PathBuf,
}

impl DirectorySelection {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The selected folder.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the selected folder, resolving `.` and similar paths.
    fn folder_name(&self) -> Option<String> {
        let dir = std::fs::canonicalize(&self.dir).unwrap_or_else(|_| self.dir.clone());
        dir.file_name().map(|n| n.to_string_lossy().into_owned())
    }
}

impl FileSelection for DirectorySelection {
    fn files(&self) -> Vec<SelectedFile> {
        let folder = self.folder_name();
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.dir).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(&self.dir) else {
                continue;
            };
            let rel = rel.to_string_lossy();
            let relative_path = match &folder {
                Some(folder) => format!("{folder}/{rel}"),
                None => rel.into_owned(),
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            let source = LocalFileSource::with_size(entry.path(), size);
            files.push(SelectedFile::new(relative_path, Arc::new(source)));
        }

        files
    }
}
