//! Tile index built from a folder selection.
//!
//! The index maps the canonical tile path (`<level>/<column>_<row>.<ext>`,
//! relative to the tile root) to the handle of the selected file. It is built
//! in a single pass over the selection and never mutated afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::LoadError;
use crate::io::{ByteSource, SelectedFile};

use super::key::TileKey;

/// One indexed tile file.
#[derive(Clone)]
pub struct TileEntry {
    /// Path relative to the tile root, e.g. "3/2_1.jpg"
    pub relative_path: String,

    /// Parsed coordinates of the tile
    pub key: TileKey,

    /// Handle to the selected file's bytes
    pub source: Arc<dyn ByteSource>,
}

impl fmt::Debug for TileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileEntry")
            .field("relative_path", &self.relative_path)
            .field("source", &self.source.identifier())
            .finish()
    }
}

/// Counters collected while building an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Files seen in the selection
    pub scanned: usize,

    /// Files that ended up in the index
    pub indexed: usize,

    /// Files not below the tile root
    pub outside_root: usize,

    /// Files below the root whose name is not a tile path
    pub non_canonical: usize,

    /// Files that replaced an earlier file with the same path
    pub duplicates: usize,
}

/// Lookup from tile path to selected file.
pub struct TileIndex {
    tile_root: String,
    entries: HashMap<String, TileEntry>,
    stats: IndexStats,
}

impl TileIndex {
    /// Build an index from an unordered selection.
    ///
    /// Files outside `tile_root/` or with names that are not tile paths are
    /// skipped. When two files map to the same path the later one wins.
    ///
    /// Returns `LoadError::EmptyTileSet` if no file remains.
    pub fn build(
        files: impl IntoIterator<Item = SelectedFile>,
        tile_root: &str,
    ) -> Result<Self, LoadError> {
        let mut entries = HashMap::new();
        let mut stats = IndexStats::default();

        for file in files {
            stats.scanned += 1;
            let normalized = normalize_path(&file.relative_path);

            let Some(rel) = strip_tile_root(&normalized, tile_root) else {
                trace!("Skipping {}: outside {}/", file.relative_path, tile_root);
                stats.outside_root += 1;
                continue;
            };

            let Some(key) = TileKey::parse(rel) else {
                trace!("Skipping {}: not a tile path", file.relative_path);
                stats.non_canonical += 1;
                continue;
            };

            let relative_path = rel.to_string();
            let entry = TileEntry {
                relative_path: relative_path.clone(),
                key,
                source: file.source,
            };
            if let Some(previous) = entries.insert(relative_path, entry) {
                debug!(
                    "Duplicate tile {}: {} replaces {}",
                    previous.relative_path,
                    file.relative_path,
                    previous.source.identifier()
                );
                stats.duplicates += 1;
            }
        }

        stats.indexed = entries.len();
        if entries.is_empty() {
            return Err(LoadError::EmptyTileSet {
                tile_root: tile_root.to_string(),
            });
        }

        Ok(Self {
            tile_root: tile_root.to_string(),
            entries,
            stats,
        })
    }

    /// Look up a tile by its path relative to the tile root.
    pub fn get(&self, relative_path: &str) -> Option<&TileEntry> {
        self.entries.get(relative_path)
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.entries.contains_key(relative_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the tile root folder this index was built for.
    pub fn tile_root(&self) -> &str {
        &self.tile_root
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Iterate over all indexed tile paths, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of tiles per pyramid level.
    pub fn level_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.key.level).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Debug for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileIndex")
            .field("tile_root", &self.tile_root)
            .field("len", &self.entries.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Normalize a selected file path.
///
/// Backslashes become `/`, and empty or `.` segments are dropped, so
/// `./image_files\\0//0_0.jpg` becomes `image_files/0/0_0.jpg`.
pub fn normalize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip `tile_root/` from a normalized path.
///
/// Returns `None` unless the first segment is exactly the tile root and
/// something follows it.
fn strip_tile_root<'a>(path: &'a str, tile_root: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(tile_root)?.strip_prefix('/')?;
    (!rest.is_empty()).then_some(rest)
}
