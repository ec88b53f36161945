//! Coordinate to reference resolution.
//!
//! ```text
//! resolve(level, column, row)
//!   1. key = "<level>/<column>_<row>.<format>"
//!   2. key not indexed        -> TileNotFound
//!   3. cached in this epoch   -> cached reference
//!   4. otherwise              -> register with the store, cache, return
//! ```
//!
//! Each key has its own slot. Steps 3 and 4 run under that slot's lock, so
//! concurrent requests for one tile share one reference while requests for
//! different tiles proceed in parallel. Registration carries the session
//! generation and is refused by the store once the session was replaced.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::trace;

use crate::error::ResolveError;
use crate::tile::{TileIndex, TileKey};

use super::references::{ReferenceStore, TileReference};

type Slot = Arc<Mutex<Option<TileReference>>>;

/// Resolves tile coordinates against one tile index.
pub struct Resolver {
    /// Generation of the session this resolver serves
    generation: u64,

    /// Tile file extension from the descriptor
    format: String,

    index: TileIndex,

    store: Arc<ReferenceStore>,

    /// Reference slots for this index, by tile path
    slots: Mutex<HashMap<String, Slot>>,
}

impl Resolver {
    pub fn new(
        generation: u64,
        format: impl Into<String>,
        index: TileIndex,
        store: Arc<ReferenceStore>,
    ) -> Self {
        Self {
            generation,
            format: format.into(),
            index,
            store,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a tile coordinate to a reference.
    ///
    /// Returns the same reference for repeated calls until the store is
    /// released. A cached reference from an earlier epoch is never returned.
    pub async fn resolve(
        &self,
        level: u32,
        column: u32,
        row: u32,
    ) -> Result<TileReference, ResolveError> {
        let key = TileKey::new(level, column, row, self.format.as_str()).to_string();

        let Some(entry) = self.index.get(&key) else {
            return Err(ResolveError::TileNotFound { key });
        };

        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut cached = slot.lock().await;
        if let Some(reference) = cached.as_ref() {
            if reference.epoch() == self.store.epoch().await {
                return Ok(reference.clone());
            }
            trace!("Dropping released reference {} for {}", reference, key);
        }

        let reference = self
            .store
            .register(self.generation, &key, entry.source.clone())
            .await?;
        *cached = Some(reference.clone());
        Ok(reference)
    }

    /// Forget every cached reference. Returns how many slots were dropped.
    pub async fn clear(&self) -> usize {
        let mut slots = self.slots.lock().await;
        let cleared = slots.len();
        slots.clear();
        cleared
    }

    pub async fn cached_count(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn store(&self) -> &Arc<ReferenceStore> {
        &self.store
    }
}
