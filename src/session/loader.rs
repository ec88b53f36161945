//! Load orchestration.
//!
//! ```text
//!            load                    success
//!   Idle ──────────► Indexing ──────────────► Ready
//!    ▲                  │                       │
//!    │   failure,       │ failure, previous     │ load
//!    └── no previous ───┤ session kept          │
//!                       ▼                       │
//!                Ready (previous) ◄─────────────┘
//! ```
//!
//! Every load takes a new generation. All references are released before
//! indexing starts, but the previous session stays active until the new one
//! is confirmed valid, so a failed reload leaves the viewer working. A load
//! that finishes after a newer one was requested is discarded.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::error::{IoError, LoadError, ResolveError};
use crate::format::{parse_descriptor, tile_root_name, DescriptorInfo};
use crate::io::{ByteSource, DirectorySelection, FileSelection, LocalFileSource};
use crate::tile::TileIndex;

use super::references::{ReferenceStore, TileReference};
use super::resolver::Resolver;

// =============================================================================
// Load Request
// =============================================================================

/// Everything needed to load one image.
pub struct LoadRequest {
    /// File name of the descriptor; its base name determines the tile root
    pub descriptor_name: String,

    /// Handle to the descriptor document
    pub descriptor: Arc<dyn ByteSource>,

    /// The selected tiles folder
    pub tiles: Arc<dyn FileSelection>,
}

impl LoadRequest {
    pub fn new(
        descriptor_name: impl Into<String>,
        descriptor: Arc<dyn ByteSource>,
        tiles: impl FileSelection + 'static,
    ) -> Self {
        Self {
            descriptor_name: descriptor_name.into(),
            descriptor,
            tiles: Arc::new(tiles),
        }
    }

    /// Build a request from a descriptor file and a tiles folder on disk.
    pub async fn from_paths(
        descriptor_path: impl AsRef<Path>,
        tiles_dir: impl AsRef<Path>,
    ) -> Result<Self, IoError> {
        let descriptor_path = descriptor_path.as_ref();
        let descriptor = LocalFileSource::open(descriptor_path).await?;
        let descriptor_name = descriptor_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| descriptor_path.display().to_string());

        Ok(Self::new(
            descriptor_name,
            Arc::new(descriptor),
            DirectorySelection::new(tiles_dir.as_ref()),
        ))
    }
}

// =============================================================================
// Session
// =============================================================================

/// State of one loaded image.
///
/// A session stays usable only while it is the loader's active session;
/// afterwards every request fails with `ResolveError::StaleReference`.
pub struct Session {
    generation: u64,
    descriptor_name: String,
    info: DescriptorInfo,
    resolver: Resolver,
}

impl Session {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn descriptor_name(&self) -> &str {
        &self.descriptor_name
    }

    pub fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    pub fn index(&self) -> &TileIndex {
        self.resolver.index()
    }

    /// Whether this is still the loader's active session.
    pub fn is_current(&self) -> bool {
        self.resolver.store().active_generation() == self.generation
    }

    /// Resolve a tile coordinate to a reference.
    ///
    /// A session replaced while the call is in flight gets
    /// `ResolveError::StaleReference` and registers nothing.
    pub async fn resolve(
        &self,
        level: u32,
        column: u32,
        row: u32,
    ) -> Result<TileReference, ResolveError> {
        self.ensure_current()?;
        self.resolver.resolve(level, column, row).await
    }

    /// Read the bytes behind a reference issued by this session.
    pub async fn fetch(&self, reference: &TileReference) -> Result<Bytes, ResolveError> {
        self.ensure_current()?;
        self.resolver.store().fetch(reference).await
    }

    /// Resolve a tile coordinate and read its bytes.
    pub async fn fetch_tile(
        &self,
        level: u32,
        column: u32,
        row: u32,
    ) -> Result<Bytes, ResolveError> {
        let reference = self.resolve(level, column, row).await?;
        self.fetch(&reference).await
    }

    fn ensure_current(&self) -> Result<(), ResolveError> {
        if self.is_current() {
            Ok(())
        } else {
            trace!("Ignoring request against superseded session {}", self.generation);
            Err(ResolveError::StaleReference {
                generation: self.generation,
            })
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("generation", &self.generation)
            .field("descriptor_name", &self.descriptor_name)
            .field("info", &self.info)
            .field("tiles", &self.resolver.index().len())
            .finish()
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Observable state of the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No image loaded
    Idle,

    /// Descriptor and tile index are being built for this generation
    Indexing { generation: u64 },

    /// The session of this generation is serving tiles
    Ready { generation: u64 },
}

struct LoaderInner {
    state: LoadState,
    session: Option<Arc<Session>>,
}

/// Owner of the active session and of every reference it issues.
pub struct Loader {
    store: Arc<ReferenceStore>,

    /// Generation of the most recent load request
    requested: AtomicU64,

    inner: Mutex<LoaderInner>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            store: Arc::new(ReferenceStore::new()),
            requested: AtomicU64::new(0),
            inner: Mutex::new(LoaderInner {
                state: LoadState::Idle,
                session: None,
            }),
        }
    }

    /// Load an image, replacing the active session on success.
    ///
    /// The descriptor is parsed before the tile selection is enumerated, so a
    /// malformed descriptor fails without scanning any tiles.
    pub async fn load(&self, request: LoadRequest) -> Result<Arc<Session>, LoadError> {
        let generation = self.requested.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut inner = self.inner.lock().await;
            self.release(&inner).await;
            if self.requested.load(Ordering::SeqCst) == generation {
                inner.state = LoadState::Indexing { generation };
            }
        }
        info!("Loading {} (generation {})", request.descriptor_name, generation);

        let result = Self::build(&request).await;

        let mut inner = self.inner.lock().await;
        if self.requested.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded load {}", generation);
            return Err(LoadError::Superseded { generation });
        }

        match result {
            Ok((info, index)) => {
                let tiles = index.len();
                let resolver =
                    Resolver::new(generation, info.format.clone(), index, self.store.clone());
                let session = Arc::new(Session {
                    generation,
                    descriptor_name: request.descriptor_name,
                    resolver,
                    info,
                });

                // Drops what the previous session issued while we were
                // indexing and stops it from issuing more
                if let Some(previous) = &inner.session {
                    previous.resolver.clear().await;
                }
                self.store.activate(generation).await;

                inner.session = Some(session.clone());
                inner.state = LoadState::Ready { generation };

                info!(
                    "Ready: {}x{} image, {} tiles (generation {})",
                    session.info.width, session.info.height, tiles, generation
                );
                Ok(session)
            }
            Err(e) => {
                inner.state = match &inner.session {
                    Some(previous) => LoadState::Ready {
                        generation: previous.generation,
                    },
                    None => LoadState::Idle,
                };
                warn!("Load {} failed: {}", generation, e);
                Err(e)
            }
        }
    }

    /// Tear down the active session and release every reference.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(session) = inner.session.take() {
            session.resolver.clear().await;
        }
        self.store.activate(0).await;
        inner.state = LoadState::Idle;
        debug!("Loader shut down");
    }

    pub async fn state(&self) -> LoadState {
        self.inner.lock().await.state
    }

    /// The active session, if any.
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.inner.lock().await.session.clone()
    }

    pub fn store(&self) -> &Arc<ReferenceStore> {
        &self.store
    }

    /// Clear the active session's cache, then release the store.
    async fn release(&self, inner: &LoaderInner) -> usize {
        if let Some(session) = &inner.session {
            session.resolver.clear().await;
        }
        self.store.release_all().await
    }

    async fn build(request: &LoadRequest) -> Result<(DescriptorInfo, TileIndex), LoadError> {
        let bytes = request.descriptor.read_all().await?;
        let info = parse_descriptor(&bytes)?;

        // Enumerating a folder on disk blocks
        let tile_root = tile_root_name(&request.descriptor_name);
        let tiles = Arc::clone(&request.tiles);
        let root = tile_root.clone();
        let index = tokio::task::spawn_blocking(move || TileIndex::build(tiles.files(), &root))
            .await
            .map_err(|e| LoadError::Indexing(e.to_string()))??;

        let stats = index.stats();
        debug!(
            "Indexed {} of {} files under {}/ ({} outside, {} not tiles, {} duplicates)",
            stats.indexed,
            stats.scanned,
            tile_root,
            stats.outside_root,
            stats.non_canonical,
            stats.duplicates
        );

        Ok((info, index))
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
