//! # dzi-local
//!
//! Local tile resolution for Deep Zoom images.
//!
//! This library lets a renderer display a large pyramidal Deep Zoom (DZI)
//! image straight from local files. A descriptor document is paired with a
//! selection of tile files, and the renderer asks for tiles by level, column
//! and row. Every tile it receives is an in-memory reference whose lifetime
//! is managed by the library.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`mod@format`] - DZI descriptor parsing and tile root naming
//! - [`io`] - Byte sources and file selections (the injected inputs)
//! - [`tile`] - Tile keys and the tile index
//! - [`session`] - Resolver, reference store and load orchestration
//! - [`viewer`] - Adapter that exposes a session as a renderer tile source
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use dzi_local::io::{MemorySource, SelectedFile};
//! use dzi_local::session::{LoadRequest, Loader};
//! use dzi_local::viewer::TileSource;
//!
//! #[tokio::main]
//! async fn main() {
//!     let descriptor = r#"<Image Format="jpg" Overlap="1" TileSize="254">
//!         <Size Width="4096" Height="4096"/>
//!     </Image>"#;
//!
//!     let tiles = vec![SelectedFile::new(
//!         "image_files/0/0_0.jpg",
//!         Arc::new(MemorySource::new(vec![0xFF, 0xD8, 0xFF], "0_0.jpg")),
//!     )];
//!
//!     let loader = Loader::new();
//!     let request = LoadRequest::new(
//!         "image.dzi",
//!         Arc::new(MemorySource::new(descriptor.as_bytes().to_vec(), "image.dzi")),
//!         tiles,
//!     );
//!     let session = loader.load(request).await.unwrap();
//!
//!     let source = TileSource::bind(session);
//!     assert!(source.tile_url(0, 0, 0).await.is_some());
//!     assert!(source.tile_url(1, 0, 0).await.is_none());
//!
//!     loader.shutdown().await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod session;
pub mod tile;
pub mod viewer;

// Re-export commonly used types
pub use config::{Cli, Command, IndexConfig, InspectConfig, ResolveConfig, SourceArgs};
pub use error::{DescriptorError, IoError, LoadError, ResolveError};
pub use format::{parse_descriptor, tile_root_name, DescriptorInfo, TILE_ROOT_SUFFIX};
pub use io::{
    ByteSource, DirectorySelection, FileSelection, LocalFileSource, MemorySource, SelectedFile,
};
pub use session::{
    LoadRequest, LoadState, Loader, ReferenceStore, Resolver, Session, TileReference,
    REFERENCE_ORIGIN,
};
pub use tile::{normalize_path, IndexStats, TileEntry, TileIndex, TileKey};
pub use viewer::{RenderingEngine, TileSource, TileSourceOptions};
