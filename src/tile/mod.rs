//! Tile index layer.
//!
//! This module turns an unordered folder selection into a lookup structure
//! keyed by tile coordinates.
//!
//! # Components
//!
//! - [`TileKey`]: `(level, column, row, format)` with the canonical path form
//!   `<level>/<column>_<row>.<format>`
//! - [`TileIndex`]: maps canonical tile paths to selected files
//! - [`TileEntry`]: one indexed file
//! - [`IndexStats`]: counters collected while building an index
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dzi_local::io::{MemorySource, SelectedFile};
//! use dzi_local::tile::TileIndex;
//!
//! let files = vec![SelectedFile::new(
//!     "image_files/0/0_0.jpg",
//!     Arc::new(MemorySource::new(vec![0xFF, 0xD8], "0_0.jpg")),
//! )];
//!
//! let index = TileIndex::build(files, "image_files").unwrap();
//! assert!(index.contains("0/0_0.jpg"));
//! ```

mod index;
mod key;

pub use index::{normalize_path, IndexStats, TileEntry, TileIndex};
pub use key::TileKey;
