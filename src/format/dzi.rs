//! Deep Zoom Image (DZI) descriptor parsing.
//!
//! A DZI descriptor declares the pyramid parameters a renderer needs:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
//!        TileSize="254"
//!        Overlap="1"
//!        Format="jpg">
//!   <Size Width="4096" Height="4096" />
//! </Image>
//! ```
//!
//! Only `Format`, `TileSize`, `Overlap` and the `Size` dimensions are read.
//! Everything else in the document is ignored.

use serde::Serialize;

use crate::error::DescriptorError;

/// Suffix appended to the descriptor base name to form the tile root folder.
pub const TILE_ROOT_SUFFIX: &str = "_files";

/// Pyramid parameters extracted from a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorInfo {
    /// Tile file extension (e.g. "jpg", "png")
    pub format: String,

    /// Edge length of a tile, excluding overlap
    pub tile_size: u32,

    /// Pixels shared with neighboring tiles
    pub overlap: u32,

    /// Full-resolution width in pixels
    pub width: u32,

    /// Full-resolution height in pixels
    pub height: u32,
}

/// Parse a DZI descriptor document.
///
/// Attribute order does not matter and `Overlap` defaults to 0 when absent.
/// The root element is matched on its local name, so documents with or
/// without the Deep Zoom namespace are accepted.
pub fn parse_descriptor(bytes: &[u8]) -> Result<DescriptorInfo, DescriptorError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DescriptorError::NotUtf8)?;
    let doc =
        roxmltree::Document::parse(text).map_err(|e| DescriptorError::Parse(e.to_string()))?;

    let image = doc.root_element();
    if image.tag_name().name() != "Image" {
        return Err(DescriptorError::MissingElement("Image"));
    }

    let size = image
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "Size")
        .ok_or(DescriptorError::MissingElement("Size"))?;

    let format = image
        .attribute("Format")
        .map(str::trim)
        .ok_or(DescriptorError::MissingAttribute {
            element: "Image",
            attribute: "Format",
        })?;
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DescriptorError::InvalidAttribute {
            attribute: "Format",
            value: format.to_string(),
            reason: "expected a file extension such as jpg or png",
        });
    }

    let tile_size = positive(
        required(image.attribute("TileSize"), "Image", "TileSize")?,
        "TileSize",
    )?;
    let overlap = match image.attribute("Overlap") {
        Some(value) => non_negative(value, "Overlap")?,
        None => 0,
    };
    let width = positive(required(size.attribute("Width"), "Size", "Width")?, "Width")?;
    let height = positive(required(size.attribute("Height"), "Size", "Height")?, "Height")?;

    Ok(DescriptorInfo {
        format: format.to_string(),
        tile_size,
        overlap,
        width,
        height,
    })
}

/// Derive the tile root folder name from a descriptor file name.
///
/// Directories and the last extension are stripped, then `_files` is
/// appended: `slides/image.dzi` becomes `image_files`.
pub fn tile_root_name(descriptor_name: &str) -> String {
    let file_name = descriptor_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(descriptor_name);

    let base = match file_name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => file_name,
    };

    format!("{base}{TILE_ROOT_SUFFIX}")
}

fn required<'a>(
    value: Option<&'a str>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, DescriptorError> {
    value.ok_or(DescriptorError::MissingAttribute { element, attribute })
}

fn non_negative(value: &str, attribute: &'static str) -> Result<u32, DescriptorError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| DescriptorError::InvalidAttribute {
            attribute,
            value: value.to_string(),
            reason: "expected a non-negative integer",
        })
}

fn positive(value: &str, attribute: &'static str) -> Result<u32, DescriptorError> {
    match non_negative(value, attribute)? {
        0 => Err(DescriptorError::InvalidAttribute {
            attribute,
            value: value.to_string(),
            reason: "must be greater than zero",
        }),
        n => Ok(n),
    }
}
