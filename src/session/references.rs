//! In-memory tile references and their lifecycle.
//!
//! A [`TileReference`] is the equivalent of a browser object URL: a
//! `blob:dzi-local/<epoch>/<id>` address bound to one selected file. The
//! [`ReferenceStore`] is the only owner of the bindings. Releasing clears all
//! of them at once and moves the store to the next epoch, after which any
//! earlier reference fails to dereference.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};
use url::Url;

use crate::error::ResolveError;
use crate::io::ByteSource;

/// Scheme and origin shared by every reference URL.
pub const REFERENCE_ORIGIN: &str = "blob:dzi-local";

// =============================================================================
// TileReference
// =============================================================================

/// Handle to the bytes of one tile, valid until the store is released.
///
/// References compare equal only if they are the same binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileReference {
    url: Url,
    key: Arc<str>,
    epoch: u64,
}

impl TileReference {
    /// The reference URL, e.g. `blob:dzi-local/1/42`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Tile path this reference is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release epoch the reference was issued in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl fmt::Display for TileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

// =============================================================================
// ReferenceStore
// =============================================================================

struct StoreState {
    /// Incremented by every release
    epoch: u64,

    /// Next id handed out within the current epoch
    next_id: u64,

    /// Live bindings by reference URL
    live: HashMap<String, Arc<dyn ByteSource>>,
}

/// Registry of every reference issued since the last release.
///
/// The store also records which session generation may register references.
/// The active generation only changes under the write lock, so a session
/// that was replaced can never register once the switch is done.
pub struct ReferenceStore {
    state: RwLock<StoreState>,

    /// Generation allowed to register, 0 when none. Written under `state`.
    active: AtomicU64,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                epoch: 1,
                next_id: 1,
                live: HashMap::new(),
            }),
            active: AtomicU64::new(0),
        }
    }

    /// Create and record a new reference bound to `source`.
    ///
    /// Every call creates a distinct reference; deduplication per tile is the
    /// resolver's job. Returns `ResolveError::StaleReference` if `generation`
    /// is not the active generation.
    pub async fn register(
        &self,
        generation: u64,
        key: &str,
        source: Arc<dyn ByteSource>,
    ) -> Result<TileReference, ResolveError> {
        let mut state = self.state.write().await;
        if self.active.load(Ordering::SeqCst) != generation {
            trace!("Refusing {} for superseded generation {}", key, generation);
            return Err(ResolveError::StaleReference { generation });
        }

        let id = state.next_id;
        state.next_id += 1;

        let url = Url::parse(&format!("{REFERENCE_ORIGIN}/{}/{id}", state.epoch))
            .expect("reference URL is well-formed");
        state.live.insert(url.as_str().to_string(), source);

        debug!("Registered {} for {}", url, key);

        Ok(TileReference {
            url,
            key: Arc::from(key),
            epoch: state.epoch,
        })
    }

    /// Read the bytes a reference is bound to.
    ///
    /// Returns `ResolveError::StaleReference` if the reference was released.
    pub async fn fetch(&self, reference: &TileReference) -> Result<Bytes, ResolveError> {
        let source = {
            let state = self.state.read().await;
            state.live.get(reference.as_str()).cloned()
        };

        match source {
            Some(source) => Ok(source.read_all().await?),
            None => Err(ResolveError::StaleReference {
                generation: reference.epoch,
            }),
        }
    }

    /// Release every recorded reference.
    ///
    /// Returns the number of references released. The store moves to a new
    /// epoch even when nothing was recorded. The active generation is kept.
    pub async fn release_all(&self) -> usize {
        let mut state = self.state.write().await;
        Self::release_locked(&mut state)
    }

    /// Release every reference and hand registration to `generation`.
    ///
    /// Both happen under one lock: no reference of the previous generation
    /// survives, and the previous generation cannot register afterwards.
    /// Pass 0 to close the store.
    pub async fn activate(&self, generation: u64) -> usize {
        let mut state = self.state.write().await;
        let released = Self::release_locked(&mut state);
        self.active.store(generation, Ordering::SeqCst);
        debug!("Active generation is now {}", generation);
        released
    }

    /// Generation currently allowed to register, 0 when none.
    pub fn active_generation(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Whether a reference can still be dereferenced.
    pub async fn is_live(&self, reference: &TileReference) -> bool {
        let state = self.state.read().await;
        state.live.contains_key(reference.as_str())
    }

    /// Number of references recorded since the last release.
    pub async fn live_count(&self) -> usize {
        let state = self.state.read().await;
        state.live.len()
    }

    /// Current release epoch.
    pub async fn epoch(&self) -> u64 {
        let state = self.state.read().await;
        state.epoch
    }

    fn release_locked(state: &mut StoreState) -> usize {
        let released = state.live.len();
        state.live.clear();
        state.epoch += 1;
        state.next_id = 1;

        if released > 0 {
            info!("Released {} tile reference(s)", released);
        }

        released
    }
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}
