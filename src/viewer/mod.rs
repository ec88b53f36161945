//! Viewer adapter.
//!
//! Binds a [`Session`] to a rendering engine as a custom tile source. The
//! engine receives the pyramid parameters as [`TileSourceOptions`] (the
//! `width`/`height`/`tileSize`/`tileOverlap` shape OpenSeadragon-style
//! engines expect) and asks the adapter for one tile at a time.
//!
//! Per-tile failures never reach the engine as errors: a missing tile is
//! reported as `None` (a blank region) and logged at debug level, and
//! requests against a superseded session are dropped silently.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::ResolveError;
use crate::format::DescriptorInfo;
use crate::session::{Session, TileReference};

/// Pyramid parameters handed to a rendering engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSourceOptions {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub tile_overlap: u32,
    pub format: String,
}

impl From<&DescriptorInfo> for TileSourceOptions {
    fn from(info: &DescriptorInfo) -> Self {
        Self {
            width: info.width,
            height: info.height,
            tile_size: info.tile_size,
            tile_overlap: info.overlap,
            format: info.format.clone(),
        }
    }
}

/// A rendering engine that can display a custom tile source.
pub trait RenderingEngine {
    /// Open a new tile source, replacing whatever was displayed.
    fn open(&mut self, options: TileSourceOptions);
}

/// Custom tile source backed by one session.
#[derive(Clone)]
pub struct TileSource {
    session: Arc<Session>,
    options: TileSourceOptions,
}

impl TileSource {
    pub fn bind(session: Arc<Session>) -> Self {
        let options = TileSourceOptions::from(session.info());
        Self { session, options }
    }

    pub fn options(&self) -> &TileSourceOptions {
        &self.options
    }

    /// Tile source options as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.options)
    }

    /// Register this tile source with an engine.
    pub fn attach<E: RenderingEngine + ?Sized>(&self, engine: &mut E) {
        debug!(
            "Attaching {} (generation {})",
            self.session.descriptor_name(),
            self.session.generation()
        );
        engine.open(self.options.clone());
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Reference URL for a tile, or `None` if the tile is unavailable.
    pub async fn tile_url(&self, level: u32, column: u32, row: u32) -> Option<Url> {
        self.tile_reference(level, column, row)
            .await
            .map(|reference| reference.url().clone())
    }

    /// Reference for a tile, or `None` if the tile is unavailable.
    pub async fn tile_reference(
        &self,
        level: u32,
        column: u32,
        row: u32,
    ) -> Option<TileReference> {
        let result = self.session.resolve(level, column, row).await;
        absorb(result)
    }

    /// Bytes of a tile, or `None` if the tile is unavailable.
    pub async fn tile_bytes(&self, level: u32, column: u32, row: u32) -> Option<Bytes> {
        let result = self.session.fetch_tile(level, column, row).await;
        absorb(result)
    }
}

/// Turn a per-tile failure into an absent tile.
fn absorb<T>(result: Result<T, ResolveError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_silent() => {
            trace!("{}", e);
            None
        }
        Err(e) => {
            debug!("Tile unavailable: {}", e);
            None
        }
    }
}
