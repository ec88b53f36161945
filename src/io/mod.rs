mod byte_source;
mod selection;

pub use byte_source::{ByteSource, LocalFileSource, MemorySource};
pub use selection::{DirectorySelection, FileSelection, SelectedFile};
