//! Load integration tests.
//!
//! Tests verify:
//! - A valid descriptor and selection produce a Ready session
//! - Load failures are specific and leave nothing Ready
//! - The descriptor is checked before any tile is scanned
//! - Tile enumeration does not block the runtime
//! - Loading from a folder on disk

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dzi_local::error::{IoError, LoadError, ResolveError};
use dzi_local::io::{LocalFileSource, MemorySource};
use dzi_local::session::{LoadRequest, LoadState, Loader};

use super::test_utils::{
    descriptor, request, tiles, BlockingSelection, TrackingSelection, MISSING_WIDTH_DESCRIPTOR,
    SAMPLE_DESCRIPTOR,
};

// =============================================================================
// Successful Loads
// =============================================================================

#[tokio::test]
async fn test_single_tile_scenario() {
    let loader = Loader::new();
    let session = loader
        .load(request("image.dzi", SAMPLE_DESCRIPTOR, &["image_files/0/0_0.jpg"]))
        .await
        .unwrap();

    assert_eq!(loader.state().await, LoadState::Ready { generation: 1 });

    let info = session.info();
    assert_eq!(info.tile_size, 254);
    assert_eq!(info.overlap, 1);
    assert_eq!(info.format, "jpg");
    assert_eq!((info.width, info.height), (4096, 4096));

    assert!(session.resolve(0, 0, 0).await.is_ok());
    assert!(matches!(
        session.resolve(1, 0, 0).await,
        Err(ResolveError::TileNotFound { ref key }) if key == "1/0_0.jpg"
    ));
}

#[tokio::test]
async fn test_foreign_files_are_ignored() {
    let loader = Loader::new();
    let session = loader
        .load(request(
            "image.dzi",
            SAMPLE_DESCRIPTOR,
            &[
                "image_files/0/0_0.jpg",
                "image_files/1/0_0.jpg",
                "image_files/1/Thumbs.db",
                "image.dzi",
                "notes/readme.txt",
            ],
        ))
        .await
        .unwrap();

    let stats = session.index().stats();
    assert_eq!(stats.scanned, 5);
    assert_eq!(stats.indexed, 2);
    assert_eq!(stats.outside_root, 2);
    assert_eq!(stats.non_canonical, 1);
}

#[tokio::test]
async fn test_backslash_paths() {
    let loader = Loader::new();
    let session = loader
        .load(request(
            "scan.dzi",
            &descriptor("png", 256, 512, 512),
            &["scan_files\\9\\1_1.png"],
        ))
        .await
        .unwrap();

    let data = session.fetch_tile(9, 1, 1).await.unwrap();
    assert_eq!(&data[..], b"scan_files\\9\\1_1.png");
}

// =============================================================================
// Failed Loads
// =============================================================================

#[tokio::test]
async fn test_empty_tile_set() {
    let loader = Loader::new();
    let err = loader
        .load(request(
            "image.dzi",
            SAMPLE_DESCRIPTOR,
            &["tiles/0/0_0.jpg", "other_files/0/0_0.jpg"],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::EmptyTileSet { ref tile_root } if tile_root == "image_files"));
    assert!(err.user_message().contains("tiles folder does not match"));
    assert_eq!(loader.state().await, LoadState::Idle);
    assert!(loader.current().await.is_none());
}

#[tokio::test]
async fn test_missing_width_fails_before_scanning() {
    let selection = TrackingSelection::new(tiles(&["image_files/0/0_0.jpg"]));
    let enumerated = selection.enumerated_flag();

    let request = LoadRequest::new(
        "image.dzi",
        Arc::new(MemorySource::new(
            MISSING_WIDTH_DESCRIPTOR.as_bytes().to_vec(),
            "image.dzi",
        )),
        selection,
    );

    let loader = Loader::new();
    let err = loader.load(request).await.unwrap_err();

    assert!(matches!(err, LoadError::MalformedDescriptor(_)));
    assert!(err.user_message().contains("descriptor"));
    assert!(!enumerated.load(Ordering::SeqCst));
    assert_eq!(loader.state().await, LoadState::Idle);
}

#[tokio::test]
async fn test_valid_descriptor_scans_selection() {
    let selection = TrackingSelection::new(tiles(&["image_files/0/0_0.jpg"]));
    let enumerated = selection.enumerated_flag();

    let request = LoadRequest::new(
        "image.dzi",
        Arc::new(MemorySource::new(
            SAMPLE_DESCRIPTOR.as_bytes().to_vec(),
            "image.dzi",
        )),
        selection,
    );

    Loader::new().load(request).await.unwrap();
    assert!(enumerated.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_enumeration_runs_off_the_runtime_thread() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let selection = BlockingSelection::new(
        tiles(&["image_files/0/0_0.jpg"]),
        Arc::clone(&ticks),
        Duration::from_millis(200),
    );
    let ticked = selection.ticked_flag();

    let request = LoadRequest::new(
        "image.dzi",
        Arc::new(MemorySource::new(
            SAMPLE_DESCRIPTOR.as_bytes().to_vec(),
            "image.dzi",
        )),
        selection,
    );

    // Single-threaded runtime: the ticker only runs if the walk is elsewhere
    Loader::new().load(request).await.unwrap();
    ticker.abort();

    assert!(ticked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_unreadable_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let request = LoadRequest::new(
        "image.dzi",
        Arc::new(LocalFileSource::with_size(dir.path().join("image.dzi"), 0)),
        tiles(&["image_files/0/0_0.jpg"]),
    );

    let err = Loader::new().load(request).await.unwrap_err();
    assert!(matches!(err, LoadError::Io(IoError::NotFound(_))));
}

// =============================================================================
// Loading From Disk
// =============================================================================

fn write_pyramid(root: &std::path::Path) {
    std::fs::write(root.join("image.dzi"), SAMPLE_DESCRIPTOR).unwrap();
    for (level, name, data) in [
        ("0", "0_0.jpg", &b"level zero"[..]),
        ("1", "0_0.jpg", &b"level one a"[..]),
        ("1", "1_0.jpg", &b"level one b"[..]),
    ] {
        let dir = root.join("image_files").join(level);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), data).unwrap();
    }
    std::fs::write(root.join("image_files").join(".DS_Store"), b"junk").unwrap();
}

#[tokio::test]
async fn test_load_from_paths() {
    let root = tempfile::tempdir().unwrap();
    write_pyramid(root.path());

    let request = LoadRequest::from_paths(
        root.path().join("image.dzi"),
        root.path().join("image_files"),
    )
    .await
    .unwrap();
    assert_eq!(request.descriptor_name, "image.dzi");

    let loader = Loader::new();
    let session = loader.load(request).await.unwrap();

    assert_eq!(session.index().len(), 3);
    assert_eq!(session.index().stats().non_canonical, 1);
    assert_eq!(session.index().level_counts().get(&1), Some(&2));

    let data = session.fetch_tile(1, 1, 0).await.unwrap();
    assert_eq!(&data[..], b"level one b");

    loader.shutdown().await;
}

#[tokio::test]
async fn test_load_from_paths_wrong_folder() {
    let root = tempfile::tempdir().unwrap();
    write_pyramid(root.path());
    std::fs::rename(root.path().join("image_files"), root.path().join("tiles")).unwrap();

    let request = LoadRequest::from_paths(root.path().join("image.dzi"), root.path().join("tiles"))
        .await
        .unwrap();

    let err = Loader::new().load(request).await.unwrap_err();
    assert!(matches!(err, LoadError::EmptyTileSet { .. }));
}

#[tokio::test]
async fn test_load_from_paths_missing_descriptor() {
    let root = tempfile::tempdir().unwrap();
    let result = LoadRequest::from_paths(
        root.path().join("missing.dzi"),
        root.path().join("missing_files"),
    )
    .await;

    assert!(matches!(result, Err(IoError::NotFound(_))));
}
