//! Viewer adapter integration tests.
//!
//! Tests verify:
//! - The engine is opened with the descriptor's pyramid parameters
//! - Tile requests map to references, bytes, or blank regions
//! - A replaced tile source stops serving tiles

use dzi_local::session::Loader;
use dzi_local::viewer::{RenderingEngine, TileSource, TileSourceOptions};

use super::test_utils::{descriptor, request, SAMPLE_DESCRIPTOR};

/// Engine that records every tile source it was opened with.
#[derive(Default)]
struct RecordingEngine {
    opened: Vec<TileSourceOptions>,
}

impl RenderingEngine for RecordingEngine {
    fn open(&mut self, options: TileSourceOptions) {
        self.opened.push(options);
    }
}

#[tokio::test]
async fn test_attach_passes_pyramid_parameters() {
    let loader = Loader::new();
    let session = loader
        .load(request("image.dzi", SAMPLE_DESCRIPTOR, &["image_files/0/0_0.jpg"]))
        .await
        .unwrap();

    let source = TileSource::bind(session);
    let mut engine = RecordingEngine::default();
    source.attach(&mut engine);

    assert_eq!(
        engine.opened,
        vec![TileSourceOptions {
            width: 4096,
            height: 4096,
            tile_size: 254,
            tile_overlap: 1,
            format: "jpg".to_string(),
        }]
    );

    let json: serde_json::Value = serde_json::from_str(&source.to_json().unwrap()).unwrap();
    assert_eq!(json["tileSize"], 254);
    assert_eq!(json["tileOverlap"], 1);
}

#[tokio::test]
async fn test_tile_requests() {
    let loader = Loader::new();
    let session = loader
        .load(request(
            "image.dzi",
            SAMPLE_DESCRIPTOR,
            &["image_files/0/0_0.jpg", "image_files/1/1_0.jpg"],
        ))
        .await
        .unwrap();
    let source = TileSource::bind(session);

    let url = source.tile_url(1, 1, 0).await.unwrap();
    assert_eq!(url.scheme(), "blob");
    assert_eq!(source.tile_url(1, 1, 0).await, Some(url));

    let bytes = source.tile_bytes(0, 0, 0).await.unwrap();
    assert_eq!(&bytes[..], b"image_files/0/0_0.jpg");

    // Missing tiles are blank regions, not failures
    assert!(source.tile_url(1, 0, 0).await.is_none());
    assert!(source.tile_bytes(5, 0, 0).await.is_none());
    assert!(source.tile_reference(0, 0, 0).await.is_some());
}

#[tokio::test]
async fn test_replaced_source_goes_quiet() {
    let loader = Loader::new();
    let mut engine = RecordingEngine::default();

    let first = loader
        .load(request("a.dzi", SAMPLE_DESCRIPTOR, &["a_files/0/0_0.jpg"]))
        .await
        .unwrap();
    let first = TileSource::bind(first);
    first.attach(&mut engine);
    assert!(first.tile_url(0, 0, 0).await.is_some());

    let second = loader
        .load(request(
            "b.dzi",
            &descriptor("png", 512, 2000, 1000),
            &["b_files/0/0_0.png"],
        ))
        .await
        .unwrap();
    let second = TileSource::bind(second);
    second.attach(&mut engine);

    assert_eq!(engine.opened.len(), 2);
    assert_eq!(engine.opened[1].tile_size, 512);
    assert_eq!(engine.opened[1].tile_overlap, 0);
    assert_eq!(engine.opened[1].format, "png");

    // In-flight requests from the old source resolve to nothing
    assert!(first.tile_url(0, 0, 0).await.is_none());
    assert!(first.tile_bytes(0, 0, 0).await.is_none());
    assert_eq!(loader.store().live_count().await, 0);

    assert!(second.tile_bytes(0, 0, 0).await.is_some());
}
