use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Opaque handle to the bytes of one selected file.
///
/// This is the stand-in for a browser `File`: the tile index and the
/// reference store only ever hold the handle, and bytes are read when a
/// renderer dereferences a tile. Implementations must be thread-safe.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Read the whole file.
    async fn read_all(&self) -> Result<Bytes, IoError>;

    /// Size of the file in bytes.
    fn size(&self) -> u64;

    /// Identifier for logging (typically the path).
    fn identifier(&self) -> &str;
}

// =============================================================================
// In-memory source
// =============================================================================

/// Byte source over a buffer that is already in memory.
///
/// Reads are zero-copy: each call returns a clone of the shared `Bytes`.
#[derive(Clone)]
pub struct MemorySource {
    data: Bytes,
    identifier: String,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>, identifier: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            identifier: identifier.into(),
        }
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn read_all(&self) -> Result<Bytes, IoError> {
        Ok(self.data.clone())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Local file source
// =============================================================================

/// Byte source backed by a file on the local disk.
///
/// The file is not opened until [`ByteSource::read_all`] is called.
#[derive(Clone)]
pub struct LocalFileSource {
    path: PathBuf,
    size: u64,
    identifier: String,
}

impl LocalFileSource {
    /// Create a source for a file whose size is already known.
    pub fn with_size(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let identifier = path.display().to_string();
        Self {
            path,
            size,
            identifier,
        }
    }

    /// Create a source for a file, querying its size from the filesystem.
    ///
    /// Returns an error if the file does not exist or is not accessible.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| IoError::from_std(path.display().to_string(), e))?;
        Ok(Self::with_size(path, metadata.len()))
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ByteSource for LocalFileSource {
    async fn read_all(&self) -> Result<Bytes, IoError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| IoError::from_std(self.identifier.clone(), e))?;
        Ok(Bytes::from(data))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
