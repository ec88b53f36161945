//! dzi-local - view Deep Zoom images from local files.
//!
//! This binary wraps the library in a small command line for inspecting a
//! descriptor, checking a tiles folder against it, and resolving tiles.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dzi_local::{
    config::{Cli, Command, IndexConfig, InspectConfig, ResolveConfig, SourceArgs},
    format::parse_descriptor,
    session::{LoadRequest, Loader, Session},
    viewer::TileSource,
    LoadError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.command.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Inspect(config) => run_inspect(config).await,
        Command::Index(config) => run_index(config).await,
        Command::Resolve(config) => run_resolve(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dzi_local=debug"
    } else {
        "dzi_local=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Inspect Command
// =============================================================================

async fn run_inspect(config: InspectConfig) -> ExitCode {
    let bytes = match tokio::fs::read(&config.descriptor).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read {}: {}", config.descriptor.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let info = match parse_descriptor(&bytes) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("{}", LoadError::from(e).user_message());
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize descriptor: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Descriptor: {}", config.descriptor.display());
        println!("  Size:      {} x {} px", info.width, info.height);
        println!("  Tile size: {} px", info.tile_size);
        println!("  Overlap:   {} px", info.overlap);
        println!("  Format:    {}", info.format);
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Index Command
// =============================================================================

async fn run_index(config: IndexConfig) -> ExitCode {
    let loader = Loader::new();
    let Some(session) = load(&loader, &config.source).await else {
        return ExitCode::FAILURE;
    };

    let index = session.index();
    let stats = index.stats();
    let levels = index.level_counts();

    if config.json {
        let json = serde_json::json!({
            "descriptor": session.descriptor_name(),
            "tileRoot": index.tile_root(),
            "info": session.info(),
            "stats": stats,
            "levels": levels,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize index: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Tile root: {}/", index.tile_root());
        println!("  Files scanned:  {}", stats.scanned);
        println!("  Tiles indexed:  {}", stats.indexed);
        println!("  Outside root:   {}", stats.outside_root);
        println!("  Not tile paths: {}", stats.non_canonical);
        println!("  Duplicates:     {}", stats.duplicates);
        println!();
        println!("Tiles per level:");
        for (level, count) in &levels {
            println!("  {:>3}: {}", level, count);
        }
    }

    loader.shutdown().await;
    ExitCode::SUCCESS
}

// =============================================================================
// Resolve Command
// =============================================================================

async fn run_resolve(config: ResolveConfig) -> ExitCode {
    let loader = Loader::new();
    let Some(session) = load(&loader, &config.source).await else {
        return ExitCode::FAILURE;
    };

    let code = resolve_tile(session, &config).await;
    loader.shutdown().await;
    code
}

async fn resolve_tile(session: Arc<Session>, config: &ResolveConfig) -> ExitCode {
    let source = TileSource::bind(session);
    let (level, column, row) = (config.level, config.column, config.row);

    let Some(reference) = source.tile_reference(level, column, row).await else {
        eprintln!("Tile {}/{}_{} is not available", level, column, row);
        return ExitCode::FAILURE;
    };

    let bytes = match source.session().fetch(&reference).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read tile {}: {}", reference.key(), e);
            return ExitCode::FAILURE;
        }
    };

    println!("{} {} ({} bytes)", reference, reference.key(), bytes.len());

    if let Some(ref output) = config.output {
        if let Err(e) = tokio::fs::write(output, &bytes).await {
            error!("Failed to write {}: {}", output.display(), e);
            return ExitCode::FAILURE;
        }
        debug!("Wrote {} bytes to {}", bytes.len(), output.display());
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Helpers
// =============================================================================

/// Load a session, printing the user-facing message on failure.
async fn load(loader: &Loader, source: &SourceArgs) -> Option<Arc<Session>> {
    let request = match LoadRequest::from_paths(&source.descriptor, source.tiles_dir()).await {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", LoadError::from(e).user_message());
            return None;
        }
    };

    match loader.load(request).await {
        Ok(session) => Some(session),
        Err(e) => {
            eprintln!("{}", e.user_message());
            None
        }
    }
}
