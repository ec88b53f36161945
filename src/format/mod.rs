//! Descriptor formats.
//!
//! Only the Deep Zoom (DZI) descriptor is supported. See [`dzi`] for the
//! accepted document shape and the tile root naming convention.

pub mod dzi;

pub use dzi::{parse_descriptor, tile_root_name, DescriptorInfo, TILE_ROOT_SUFFIX};
