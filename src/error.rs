use thiserror::Error;

/// I/O errors that can occur when reading selected files
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// The file behind a byte source no longer exists
    #[error("File not found: {0}")]
    NotFound(String),

    /// Reading the file failed
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
}

impl IoError {
    /// Build an `IoError` from a `std::io::Error` for the given path.
    pub fn from_std(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            IoError::NotFound(path)
        } else {
            IoError::Read {
                path,
                message: err.to_string(),
            }
        }
    }
}

/// Errors that can occur when parsing a Deep Zoom descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// Descriptor bytes are not valid UTF-8
    #[error("Descriptor is not valid UTF-8")]
    NotUtf8,

    /// Descriptor is not well-formed XML
    #[error("Descriptor is not valid XML: {0}")]
    Parse(String),

    /// A required element is missing
    #[error("Missing <{0}> element")]
    MissingElement(&'static str),

    /// A required attribute is missing
    #[error("Missing {attribute} attribute on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// An attribute is present but has an unusable value
    #[error("Invalid {attribute} value {value:?}: {reason}")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Errors that abort a load attempt
///
/// None of these affect a session that is already displayed.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The descriptor could not be parsed
    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(#[from] DescriptorError),

    /// No tile file matched the expected tile root after filtering
    #[error("No tiles found under '{tile_root}/'")]
    EmptyTileSet { tile_root: String },

    /// The descriptor could not be read
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The background task enumerating the tile selection failed
    #[error("Tile indexing task failed: {0}")]
    Indexing(String),

    /// A newer load was requested before this one finished
    #[error("Load {generation} was superseded by a newer load")]
    Superseded { generation: u64 },
}

impl LoadError {
    /// Whether this error reflects normal cancellation rather than a failure.
    pub fn is_superseded(&self) -> bool {
        matches!(self, LoadError::Superseded { .. })
    }

    /// The message shown to the user for a failed load.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::MalformedDescriptor(e) => {
                format!("The descriptor file is not a valid Deep Zoom descriptor ({e}).")
            }
            LoadError::EmptyTileSet { tile_root } => format!(
                "The tiles folder does not match the descriptor: expected a folder named '{tile_root}'."
            ),
            LoadError::Io(e) => format!("The descriptor file could not be read ({e})."),
            LoadError::Indexing(e) => format!("The tiles folder could not be scanned ({e})."),
            LoadError::Superseded { .. } => String::from("The load was replaced by a newer one."),
        }
    }
}

/// Errors that can occur when resolving or fetching a single tile
///
/// These never abort the session.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No selected file backs this tile coordinate
    #[error("Tile not found: {key}")]
    TileNotFound { key: String },

    /// The request belongs to a session or reference that was released
    #[error("Stale request against released generation {generation}")]
    StaleReference { generation: u64 },

    /// Reading the tile bytes failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl ResolveError {
    /// Whether this error must not be reported to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, ResolveError::StaleReference { .. })
    }
}
