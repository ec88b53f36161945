use std::fmt;

/// Coordinates of one tile file within the tile root.
///
/// The canonical text form is `<level>/<column>_<row>.<format>`, which is
/// both the key of the tile index and the path a renderer asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub level: u32,
    pub column: u32,
    pub row: u32,
    pub format: String,
}

impl TileKey {
    pub fn new(level: u32, column: u32, row: u32, format: impl Into<String>) -> Self {
        Self {
            level,
            column,
            row,
            format: format.into(),
        }
    }

    /// Parse a path relative to the tile root, like "3/2_1.jpg".
    ///
    /// Only the canonical form is accepted: plain decimal numbers without
    /// sign or leading zeros, and a non-empty extension. Anything else
    /// returns `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let (level, file) = path.split_once('/')?;
        let (name, format) = file.rsplit_once('.')?;
        let (column, row) = name.split_once('_')?;

        if format.is_empty() || format.contains('/') {
            return None;
        }

        let key = Self::new(
            parse_coord(level)?,
            parse_coord(column)?,
            parse_coord(row)?,
            format,
        );

        (key.to_string() == path).then_some(key)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}_{}.{}", self.level, self.column, self.row, self.format)
    }
}

fn parse_coord(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
