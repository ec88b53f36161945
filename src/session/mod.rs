//! Session layer: resolution and lifecycle of tile references.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           Rendering engine              │
//! └────────────────────┬────────────────────┘
//!                      │ resolve(level, col, row)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     Session (one per loaded image)      │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   Resolver   │  │   TileIndex     │  │
//! │  │ (per-key     │  │ (path → file)   │  │
//! │  │  cache)      │  │                 │  │
//! │  └──────┬───────┘  └─────────────────┘  │
//! └─────────┼───────────────────────────────┘
//!           │ register / fetch
//!           ▼
//! ┌─────────────────────────────────────────┐
//! │  ReferenceStore (owned by the Loader)   │
//! │  blob:dzi-local/<epoch>/<id> → file     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The [`Loader`] creates sessions, releases every reference before each
//! load and on shutdown, and discards results of superseded loads. The store
//! only accepts registrations from the active session's generation, so a
//! replaced session cannot issue references even mid-request.
//!
//! # Example
//!
//! ```no_run
//! use dzi_local::session::{LoadRequest, Loader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = Loader::new();
//!
//!     let request = LoadRequest::from_paths("scan.dzi", "scan_files").await?;
//!     let session = loader.load(request).await?;
//!
//!     let reference = session.resolve(0, 0, 0).await?;
//!     let bytes = session.fetch(&reference).await?;
//!     println!("{} -> {} bytes", reference, bytes.len());
//!
//!     loader.shutdown().await;
//!     Ok(())
//! }
//! ```

mod loader;
mod references;
mod resolver;

pub use loader::{LoadRequest, LoadState, Loader, Session};
pub use references::{ReferenceStore, TileReference, REFERENCE_ORIGIN};
pub use resolver::Resolver;
