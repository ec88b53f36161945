//! Configuration for the `dzi-local` command line.
//!
//! Arguments are parsed with clap. Paths can also be supplied through
//! environment variables with the `DZI_` prefix:
//!
//! - `DZI_DESCRIPTOR` - Path to the `.dzi` descriptor
//! - `DZI_TILES` - Path to the tiles folder (`<name>_files`)
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use dzi_local::config::Cli;
//!
//! let cli = Cli::parse();
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// CLI Arguments
// =============================================================================

/// dzi-local - view Deep Zoom images from local files.
///
/// Pairs a DZI descriptor with its tiles folder and resolves tiles by
/// level/column/row without any server.
#[derive(Parser, Debug, Clone)]
#[command(name = "dzi-local")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a descriptor and print its pyramid parameters.
    Inspect(InspectConfig),

    /// Load a descriptor and tiles folder and print index statistics.
    Index(IndexConfig),

    /// Resolve one tile and print its reference.
    Resolve(ResolveConfig),
}

/// Paths shared by every command that loads an image.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to the DZI descriptor.
    #[arg(env = "DZI_DESCRIPTOR")]
    pub descriptor: PathBuf,

    /// Path to the tiles folder.
    ///
    /// Defaults to `<descriptor name>_files` next to the descriptor.
    #[arg(env = "DZI_TILES")]
    pub tiles: Option<PathBuf>,
}

impl SourceArgs {
    /// Tiles folder, falling back to the conventional location.
    pub fn tiles_dir(&self) -> PathBuf {
        if let Some(ref tiles) = self.tiles {
            return tiles.clone();
        }
        let name = self
            .descriptor
            .file_name()
            .map(|n| crate::format::tile_root_name(&n.to_string_lossy()))
            .unwrap_or_default();
        self.descriptor.with_file_name(name)
    }

    fn validate(&self) -> Result<(), String> {
        if self.descriptor.as_os_str().is_empty() {
            return Err(
                "Descriptor path is required. Pass it as an argument or set DZI_DESCRIPTOR"
                    .to_string(),
            );
        }
        if matches!(self.tiles, Some(ref t) if t.as_os_str().is_empty()) {
            return Err("Tiles folder path must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    /// Path to the DZI descriptor.
    #[arg(env = "DZI_DESCRIPTOR")]
    pub descriptor: PathBuf,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IndexConfig {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveConfig {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Pyramid level (0 = coarsest).
    #[arg(long, short)]
    pub level: u32,

    /// Tile column.
    #[arg(long, short)]
    pub column: u32,

    /// Tile row.
    #[arg(long, short)]
    pub row: u32,

    /// Write the tile bytes to this file.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl Command {
    /// Validate the command arguments and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Command::Inspect(config) => {
                if config.descriptor.as_os_str().is_empty() {
                    return Err("Descriptor path is required".to_string());
                }
                Ok(())
            }
            Command::Index(config) => config.source.validate(),
            Command::Resolve(config) => {
                config.source.validate()?;
                if matches!(config.output, Some(ref o) if o.as_os_str().is_empty()) {
                    return Err("Output path must not be empty".to_string());
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
